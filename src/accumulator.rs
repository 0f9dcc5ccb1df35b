use std::collections::HashMap;

use crate::config::AccumulatorMode;
use crate::detection::TrackId;
use crate::math;

/// Raw pixel-diameter samples, one shared buffer or one per track.
#[derive(Debug, Clone)]
pub enum DiameterBuffer {
    Global(Vec<u32>),
    PerKey(HashMap<TrackId, Vec<u32>>),
}

impl DiameterBuffer {
    pub fn new(mode: AccumulatorMode) -> Self {
        match mode {
            AccumulatorMode::Global => DiameterBuffer::Global(Vec::new()),
            AccumulatorMode::PerKey => DiameterBuffer::PerKey(HashMap::new()),
        }
    }

    #[inline]
    pub fn mode(&self) -> AccumulatorMode {
        match self {
            DiameterBuffer::Global(_) => AccumulatorMode::Global,
            DiameterBuffer::PerKey(_) => AccumulatorMode::PerKey,
        }
    }

    pub fn add(&mut self, px: u32, key: TrackId) {
        match self {
            DiameterBuffer::Global(samples) => samples.push(px),
            DiameterBuffer::PerKey(map) => map.entry(key).or_default().push(px),
        }
    }

    #[inline]
    pub fn samples(&self, key: TrackId) -> &[u32] {
        match self {
            DiameterBuffer::Global(samples) => samples.as_slice(),
            DiameterBuffer::PerKey(map) => map.get(&key).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Median of the non-zero samples; zero samples carry no measurement.
    pub fn representative(&self, key: TrackId) -> Option<f32> {
        let measured: Vec<f32> = self
            .samples(key)
            .iter()
            .filter(|&&px| px != 0)
            .map(|&px| px as f32)
            .collect();

        math::median(&measured)
    }

    /// Empties the shared buffer; per-key buffers are left alone.
    pub fn clear_global(&mut self) {
        if let DiameterBuffer::Global(samples) = self {
            samples.clear();
        }
    }
}
