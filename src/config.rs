use serde_derive::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Error;

const MAX_UTC_OFFSET_SECS: i32 = 24 * 3600;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CountingConfig {
    pub camera_id: String,
    pub line: LineConfig,
    #[serde(default = "default_dwell_frames")]
    pub dwell_frames: u32,
    #[serde(default)]
    pub accumulator: AccumulatorMode,
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub stabilizer: StabilizerConfig,
    /// Duplicate suppression is enabled for this session iff present.
    #[serde(default)]
    pub dedup: Option<DedupConfig>,
    #[serde(default)]
    pub measurement: MeasurementConfig,
    #[serde(default = "default_true")]
    pub count_unmeasured: bool,
    #[serde(default = "default_utc_offset_secs")]
    pub utc_offset_secs: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LineConfig {
    pub start: [f32; 2],
    pub end: [f32; 2],
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccumulatorMode {
    #[default]
    Global,
    PerKey,
}

/// Half-open `[pixel_lo, pixel_hi)` interval mapped to one physical size.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CalibrationInterval {
    pub physical: f32,
    pub pixel_lo: f32,
    pub pixel_hi: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CalibrationConfig {
    #[serde(default)]
    pub intervals: Vec<CalibrationInterval>,
    pub px_ratio: f32,
    pub allowed: Vec<f32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct StabilizerConfig {
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: i64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DedupConfig {
    #[serde(default = "default_dedup_threshold")]
    pub threshold: u32,
    #[serde(default = "default_eviction_age_secs")]
    pub eviction_age_secs: i64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            threshold: default_dedup_threshold(),
            eviction_age_secs: default_eviction_age_secs(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MeasurementConfig {
    #[serde(default = "default_band_half_width")]
    pub band_half_width: usize,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            band_half_width: default_band_half_width(),
        }
    }
}

fn default_dwell_frames() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_utc_offset_secs() -> i32 {
    (5 * 60 + 30) * 60
}

fn default_window() -> usize {
    5
}

fn default_stale_after_secs() -> i64 {
    7200
}

fn default_dedup_threshold() -> u32 {
    10
}

fn default_eviction_age_secs() -> i64 {
    30
}

fn default_band_half_width() -> usize {
    1
}

impl CountingConfig {
    /// Config with reference defaults for everything but the line and calibration.
    pub fn new(camera_id: &str, line: LineConfig, calibration: CalibrationConfig) -> Self {
        Self {
            camera_id: camera_id.to_string(),
            line,
            dwell_frames: default_dwell_frames(),
            accumulator: AccumulatorMode::default(),
            calibration,
            stabilizer: StabilizerConfig::default(),
            dedup: None,
            measurement: MeasurementConfig::default(),
            count_unmeasured: default_true(),
            utc_offset_secs: default_utc_offset_secs(),
        }
    }

    pub fn from_json_str(src: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(src)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let src = std::fs::read_to_string(path)?;

        Self::from_json_str(&src)
    }

    #[inline]
    pub fn cross_line(&self) -> f32 {
        self.line.start[0]
    }

    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        let [sx, sy] = self.line.start;
        let [ex, ey] = self.line.end;
        if !(sx.is_finite() && sy.is_finite() && ex.is_finite() && ey.is_finite()) {
            return invalid("line endpoints must be finite".into());
        }

        if (ey - sy).abs() <= f32::EPSILON {
            return invalid(format!(
                "line ({}, {}) -> ({}, {}) must not be horizontal or degenerate",
                sx, sy, ex, ey
            ));
        }

        let cal = &self.calibration;
        if cal.allowed.is_empty() {
            return invalid("calibration.allowed must not be empty".into());
        }

        if !cal.px_ratio.is_finite() || cal.allowed.iter().any(|v| !v.is_finite()) {
            return invalid("calibration values must be finite".into());
        }

        if let Some(iv) = cal.intervals.iter().find(|iv| iv.pixel_lo >= iv.pixel_hi) {
            return invalid(format!(
                "calibration interval [{}, {}) for {} is empty",
                iv.pixel_lo, iv.pixel_hi, iv.physical
            ));
        }

        if self.stabilizer.window == 0 {
            return invalid("stabilizer.window must be positive".into());
        }

        if self.measurement.band_half_width == 0 {
            return invalid("measurement.band_half_width must be positive".into());
        }

        if self.utc_offset_secs.abs() >= MAX_UTC_OFFSET_SECS {
            return invalid(format!("utc offset {}s out of range", self.utc_offset_secs));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "camera_id": "ccm6",
        "line": { "start": [320, 0], "end": [320, 480] },
        "calibration": {
            "intervals": [
                { "physical": 150, "pixel_lo": 30, "pixel_hi": 45 },
                { "physical": 200, "pixel_lo": 45, "pixel_hi": 60 }
            ],
            "px_ratio": 0.5,
            "allowed": [25, 50, 75]
        }
    }"#;

    #[test]
    fn defaults_match_reference_constants() {
        let config = CountingConfig::from_json_str(MINIMAL).unwrap();

        assert_eq!(config.cross_line(), 320.0);
        assert_eq!(config.dwell_frames, 2);
        assert_eq!(config.accumulator, AccumulatorMode::Global);
        assert_eq!(config.stabilizer.window, 5);
        assert_eq!(config.stabilizer.stale_after_secs, 7200);
        assert_eq!(config.dedup, None);
        assert_eq!(config.measurement.band_half_width, 1);
        assert!(config.count_unmeasured);
        assert_eq!(config.utc_offset_secs, 19800);
        assert_eq!(config.calibration.intervals[1].physical, 200.0);
    }

    #[test]
    fn dedup_block_enables_suppression() {
        let src = MINIMAL.replacen(
            "\"camera_id\"",
            "\"dedup\": {}, \"accumulator\": \"per_key\", \"camera_id\"",
            1,
        );
        let config = CountingConfig::from_json_str(&src).unwrap();

        assert_eq!(config.dedup, Some(DedupConfig::default()));
        assert_eq!(config.accumulator, AccumulatorMode::PerKey);
    }

    #[test]
    fn rejects_horizontal_line() {
        let src = MINIMAL.replace("[320, 480]", "[600, 0]");

        assert!(matches!(
            CountingConfig::from_json_str(&src),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_empty_allowed_set() {
        let src = MINIMAL.replace("[25, 50, 75]", "[]");

        assert!(matches!(
            CountingConfig::from_json_str(&src),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_band_width() {
        let src = MINIMAL.replacen(
            "\"camera_id\"",
            "\"measurement\": { \"band_half_width\": 0 }, \"camera_id\"",
            1,
        );

        assert!(matches!(
            CountingConfig::from_json_str(&src),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            CountingConfig::from_json_str("{ \"camera_id\": "),
            Err(Error::ConfigParseError(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            CountingConfig::load("/nonexistent/linecount.json"),
            Err(Error::IoError(_))
        ));
    }
}
