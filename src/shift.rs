use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// Eight hour work shift: A 06-14, B 14-22, C 22-06 local time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shift {
    A,
    B,
    C,
}

impl Shift {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=13 => Shift::A,
            14..=21 => Shift::B,
            _ => Shift::C,
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Shift::A => "A",
            Shift::B => "B",
            Shift::C => "C",
        };

        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShiftScheduler {
    offset: FixedOffset,
}

impl ShiftScheduler {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn from_offset_secs(secs: i32) -> Result<Self, Error> {
        FixedOffset::east_opt(secs)
            .map(Self::new)
            .ok_or_else(|| Error::InvalidConfig(format!("utc offset {}s out of range", secs)))
    }

    #[inline]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    #[inline]
    pub fn current_label(&self, now: DateTime<Utc>) -> Shift {
        Shift::from_hour(now.with_timezone(&self.offset).hour())
    }
}
