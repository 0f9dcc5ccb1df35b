pub mod accumulator;
pub mod bbox;
pub mod calibration;
pub mod config;
pub mod crossing;
pub mod dedup;
pub mod detection;
pub mod diameter;
pub mod error;
pub mod frame;
pub mod mask;
pub mod session;
pub mod shift;
pub mod stabilizer;

mod circular_queue;
mod math;

pub use config::CountingConfig;
pub use detection::{Detection, TrackId};
pub use frame::Frame;
pub use session::{CountingSession, Counts, CrossingRecord, FrameReport};
pub use shift::Shift;

use error::Error;
use std::collections::HashMap;

pub trait Counting {
    fn update(&mut self, frames: &[Frame], src: &str) -> Result<Vec<CrossingRecord>, Error>;
    fn counts(&self, src: &str) -> Option<Counts>;
}

/// Line counters for several cameras, one independent session per source.
pub struct LineCounter {
    configs: HashMap<String, CountingConfig>,
    sessions: HashMap<String, CountingSession>,
}

impl LineCounter {
    pub fn new() -> Self {
        Self {
            configs: HashMap::new(),
            sessions: HashMap::new(),
        }
    }

    pub fn register(&mut self, src: &str, config: CountingConfig) -> Result<(), Error> {
        config.validate()?;
        self.sessions.remove(src);
        self.configs.insert(src.to_string(), config);

        Ok(())
    }

    #[inline]
    pub fn session(&self, src: &str) -> Option<&CountingSession> {
        self.sessions.get(src)
    }
}

impl Default for LineCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::Counting for LineCounter {
    fn update(&mut self, frames: &[Frame], src: &str) -> Result<Vec<CrossingRecord>, Error> {
        let mut records = Vec::new();

        for frame in frames {
            let session = if let Some(session) = self.sessions.get_mut(src) {
                session
            } else {
                let config = self
                    .configs
                    .get(src)
                    .ok_or_else(|| Error::UnknownSource(src.to_string()))?;
                let session = CountingSession::new(config, frame.timestamp)?;

                self.sessions.entry(src.to_string()).or_insert(session)
            };

            records.extend(session.process(frame).crossings);
        }

        Ok(records)
    }

    #[inline]
    fn counts(&self, src: &str) -> Option<Counts> {
        self.sessions.get(src).map(CountingSession::counts)
    }
}
