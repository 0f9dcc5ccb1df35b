use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::HashMap;

use crate::config::DedupConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupEntry {
    pub count: u32,
    pub touched_at: DateTime<Utc>,
}

/// Collapses repeated crossings of one logical id caused by tracker
/// fragmentation.
#[derive(Debug, Clone)]
pub struct DuplicateSuppressor {
    threshold: u32,
    eviction_age: Duration,
    entries: HashMap<String, DedupEntry>,
}

impl DuplicateSuppressor {
    pub fn new(threshold: u32, eviction_age: Duration) -> Self {
        Self {
            threshold,
            eviction_age,
            entries: HashMap::new(),
        }
    }

    /// Registers one more crossing of `logical_id` and tells whether it
    /// should be trimmed. Anonymous crossings are always trimmed.
    pub fn should_trim(&mut self, logical_id: Option<&str>, now: DateTime<Utc>) -> bool {
        self.sweep(now);

        let id = match logical_id {
            Some(id) => id,
            None => return true,
        };

        let entry = self
            .entries
            .entry(id.to_string())
            .or_insert(DedupEntry {
                count: 0,
                touched_at: now,
            });

        entry.count += 1;
        entry.touched_at = now;

        entry.count > self.threshold
    }

    /// Drops entries untouched for longer than the eviction age.
    pub fn sweep(&mut self, now: DateTime<Utc>) {
        let age = self.eviction_age;
        let before = self.entries.len();

        self.entries.retain(|_, e| now - e.touched_at <= age);

        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!("evicted {} stale dedup entries", evicted);
        }
    }

    #[inline]
    pub fn get(&self, logical_id: &str) -> Option<&DedupEntry> {
        self.entries.get(logical_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear()
    }
}

impl From<&DedupConfig> for DuplicateSuppressor {
    fn from(cfg: &DedupConfig) -> Self {
        Self::new(cfg.threshold, Duration::seconds(cfg.eviction_age_secs))
    }
}
