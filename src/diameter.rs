use chrono::{DateTime, Utc};

use crate::accumulator::DiameterBuffer;
use crate::calibration::Calibration;
use crate::config::CountingConfig;
use crate::detection::TrackId;
use crate::stabilizer::DiameterStabilizer;

/// Physical diameter of one counted object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub pixels: f32,
    pub physical: f32,
}

#[derive(Debug, Clone)]
pub struct DiameterEstimator {
    buffer: DiameterBuffer,
    calibration: Calibration,
    stabilizer: DiameterStabilizer,
}

impl DiameterEstimator {
    pub fn new(
        buffer: DiameterBuffer,
        calibration: Calibration,
        stabilizer: DiameterStabilizer,
    ) -> Self {
        Self {
            buffer,
            calibration,
            stabilizer,
        }
    }

    pub fn from_config(config: &CountingConfig) -> Self {
        Self::new(
            DiameterBuffer::new(config.accumulator),
            (&config.calibration).into(),
            (&config.stabilizer).into(),
        )
    }

    #[inline]
    pub fn add(&mut self, px: u32, key: TrackId) {
        self.buffer.add(px, key)
    }

    #[inline]
    pub fn representative(&self, key: TrackId) -> Option<f32> {
        self.buffer.representative(key)
    }

    /// Calibrated and stabilized value for `px`; updates the vote window.
    pub fn to_physical(&mut self, px: f32, logical_id: &str, now: DateTime<Utc>) -> f32 {
        let candidate = self.calibration.to_physical(px);

        self.stabilizer.verify(candidate, logical_id, now)
    }

    pub fn measure(
        &mut self,
        key: TrackId,
        logical_id: &str,
        now: DateTime<Utc>,
    ) -> Option<Measurement> {
        let pixels = self.representative(key)?;
        let physical = self.to_physical(pixels, logical_id, now);

        Some(Measurement { pixels, physical })
    }

    #[inline]
    pub fn clear_global(&mut self) {
        self.buffer.clear_global()
    }

    #[inline]
    pub fn stabilizer(&self) -> &DiameterStabilizer {
        &self.stabilizer
    }
}
