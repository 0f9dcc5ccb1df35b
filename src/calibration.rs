use crate::config::{CalibrationConfig, CalibrationInterval};
use crate::math;

/// Pixel to physical conversion: ordered interval table, then ratio fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    intervals: Vec<CalibrationInterval>,
    px_ratio: f32,
    allowed: Vec<f32>,
}

impl Calibration {
    pub fn new(intervals: Vec<CalibrationInterval>, px_ratio: f32, allowed: Vec<f32>) -> Self {
        Self {
            intervals,
            px_ratio,
            allowed,
        }
    }

    /// Value of the first interval containing `px`, in table order.
    pub fn lookup(&self, px: f32) -> Option<f32> {
        self.intervals
            .iter()
            .find(|iv| px >= iv.pixel_lo && px < iv.pixel_hi)
            .map(|iv| iv.physical)
    }

    /// `px * ratio` snapped to the nearest allowed value.
    pub fn fallback(&self, px: f32) -> f32 {
        let raw = px * self.px_ratio;

        math::nearest(&self.allowed, raw).unwrap_or(raw)
    }

    #[inline]
    pub fn to_physical(&self, px: f32) -> f32 {
        self.lookup(px).unwrap_or_else(|| self.fallback(px))
    }
}

impl From<&CalibrationConfig> for Calibration {
    fn from(cfg: &CalibrationConfig) -> Self {
        Self::new(cfg.intervals.clone(), cfg.px_ratio, cfg.allowed.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(physical: f32, pixel_lo: f32, pixel_hi: f32) -> CalibrationInterval {
        CalibrationInterval {
            physical,
            pixel_lo,
            pixel_hi,
        }
    }

    #[test]
    fn first_matching_interval_wins() {
        let cal = Calibration::new(
            vec![iv(150.0, 30.0, 45.0), iv(160.0, 40.0, 50.0)],
            0.5,
            vec![25.0],
        );

        assert_eq!(cal.to_physical(41.0), 150.0);
        assert_eq!(cal.to_physical(45.0), 160.0);
        assert_eq!(cal.lookup(50.0), None);
    }

    #[test]
    fn intervals_are_half_open() {
        let cal = Calibration::new(vec![iv(150.0, 30.0, 45.0)], 1.0, vec![999.0]);

        assert_eq!(cal.lookup(30.0), Some(150.0));
        assert_eq!(cal.lookup(44.99), Some(150.0));
        assert_eq!(cal.lookup(45.0), None);
    }

    #[test]
    fn fallback_snaps_to_allowed() {
        let cal = Calibration::new(vec![], 0.5, vec![25.0, 50.0, 75.0]);

        assert_eq!(cal.to_physical(100.0), 50.0);
        assert_eq!(cal.to_physical(130.0), 75.0);
        assert_eq!(cal.to_physical(0.0), 25.0);
    }

    #[test]
    fn fallback_tie_goes_to_first_listed() {
        let cal = Calibration::new(vec![], 1.0, vec![60.0, 40.0]);

        assert_eq!(cal.to_physical(50.0), 60.0);
    }
}
