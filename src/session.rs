use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_derive::Serialize;
use std::collections::HashSet;

use crate::config::CountingConfig;
use crate::crossing::{CrossingDetector, ReferenceLine};
use crate::dedup::DuplicateSuppressor;
use crate::detection::{Detection, TrackId};
use crate::diameter::DiameterEstimator;
use crate::error::Error;
use crate::frame::Frame;
use crate::mask;
use crate::shift::{Shift, ShiftScheduler};

/// One counted crossing, ready to be handed to a sink.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CrossingRecord {
    pub logical_id: String,
    pub track_id: TrackId,
    pub physical_value: Option<f32>,
    pub pixel_diameter: Option<f32>,
    pub shift: Shift,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub shift: Shift,
    pub in_count: u32,
    pub out_count: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub shift: Shift,
    pub in_count: u32,
    pub out_count: u32,
    pub crossings: Vec<CrossingRecord>,
}

/// Counting state of one camera line. Not shared between cameras.
pub struct CountingSession {
    camera_id: String,
    band_half_width: usize,
    count_unmeasured: bool,
    detector: CrossingDetector,
    estimator: DiameterEstimator,
    suppressor: Option<DuplicateSuppressor>,
    scheduler: ShiftScheduler,
    shift: Shift,
    in_count: u32,
    out_count: u32,
    counted_ids: HashSet<TrackId>,
}

impl CountingSession {
    pub fn new(config: &CountingConfig, started_at: DateTime<Utc>) -> Result<Self, Error> {
        config.validate()?;

        let scheduler = ShiftScheduler::from_offset_secs(config.utc_offset_secs)?;
        let shift = scheduler.current_label(started_at);

        info!(
            "starting line counter for camera {} (line x={}, shift {})",
            config.camera_id,
            config.cross_line(),
            shift
        );

        Ok(Self {
            camera_id: config.camera_id.clone(),
            band_half_width: config.measurement.band_half_width,
            count_unmeasured: config.count_unmeasured,
            detector: CrossingDetector::new(ReferenceLine::from(&config.line), config.dwell_frames),
            estimator: DiameterEstimator::from_config(config),
            suppressor: config.dedup.as_ref().map(Into::into),
            scheduler,
            shift,
            in_count: 0,
            out_count: 0,
            counted_ids: HashSet::new(),
        })
    }

    #[inline]
    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    #[inline]
    pub fn counts(&self) -> Counts {
        Counts {
            shift: self.shift,
            in_count: self.in_count,
            out_count: self.out_count,
        }
    }

    #[inline]
    pub fn is_counted(&self, track_id: TrackId) -> bool {
        self.counted_ids.contains(&track_id)
    }

    #[inline]
    pub fn logical_id(&self, track_id: TrackId) -> String {
        format!("{}_{}", self.camera_id, track_id)
    }

    pub fn process(&mut self, frame: &Frame) -> FrameReport {
        let now = frame.timestamp;
        let shift = self.scheduler.current_label(now);

        if frame.is_empty() {
            self.estimator.clear_global();
        }

        if let Some(suppressor) = &mut self.suppressor {
            suppressor.sweep(now);
        }

        let crossings = frame
            .iter()
            .filter_map(|det| self.process_detection(det, frame.dims, shift, now))
            .collect();

        if shift != self.shift {
            self.change_shift(shift, now);
        }

        FrameReport {
            shift: self.shift,
            in_count: self.in_count,
            out_count: self.out_count,
            crossings,
        }
    }

    fn process_detection(
        &mut self,
        det: &Detection,
        dims: (u32, u32),
        shift: Shift,
        now: DateTime<Utc>,
    ) -> Option<CrossingRecord> {
        let crossing = self.detector.classify(det.track_id, &det.bbox);
        let track_id = crossing.track_id?;

        if crossing.reversed {
            self.out_count += 1;
            debug!("track {} came back across the line", track_id);
        }

        if crossing.straddling {
            match &det.mask {
                Some(m) if m.dim() == (dims.1 as usize, dims.0 as usize) => {
                    let px = mask::pixel_diameter(m.view(), self.band_half_width);
                    self.estimator.add(px, track_id);
                }
                Some(m) => warn!(
                    "track {}: mask {:?} does not match frame {}x{}, not measured",
                    track_id,
                    m.dim(),
                    dims.0,
                    dims.1
                ),
                None => {}
            }
        }

        if !crossing.crossed {
            return None;
        }

        if self.counted_ids.contains(&track_id) {
            return None;
        }

        let logical_id = self.logical_id(track_id);

        if let Some(suppressor) = &mut self.suppressor {
            if suppressor.should_trim(Some(&logical_id), now) {
                debug!("trimmed duplicate crossing of {}", logical_id);
                return None;
            }
        }

        let measurement = self.estimator.measure(track_id, &logical_id, now);
        if measurement.is_none() && !self.count_unmeasured {
            warn!("dropping crossing of {}: no diameter measured", logical_id);
            return None;
        }

        self.in_count += 1;
        self.counted_ids.insert(track_id);

        debug!(
            "{} crossed (dwell {}), diameter {:?}",
            logical_id, crossing.dwell_count, measurement
        );

        Some(CrossingRecord {
            logical_id,
            track_id,
            physical_value: measurement.map(|m| m.physical),
            pixel_diameter: measurement.map(|m| m.pixels),
            shift,
            timestamp: now,
        })
    }

    fn change_shift(&mut self, shift: Shift, now: DateTime<Utc>) {
        info!(
            "camera {}: changing shift from {} to {} at {}",
            self.camera_id,
            self.shift,
            shift,
            now.with_timezone(&self.scheduler.offset())
        );

        self.shift = shift;
        self.in_count = 1;
        self.out_count = 0;
        self.counted_ids.clear();
        self.detector.reset_tracks();
    }

    #[inline]
    pub fn suppressor(&self) -> Option<&DuplicateSuppressor> {
        self.suppressor.as_ref()
    }

    #[inline]
    pub fn estimator(&self) -> &DiameterEstimator {
        &self.estimator
    }
}
