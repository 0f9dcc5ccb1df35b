use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::circular_queue::CircularQueue;
use crate::config::StabilizerConfig;
use crate::math;

/// Majority vote over the last few measurement events.
///
/// Each logical id holds at most one slot; once the window is saturated a
/// strict majority value replaces the incoming candidate.
#[derive(Debug, Clone)]
pub struct DiameterStabilizer {
    stale_after: Duration,
    queue: CircularQueue<(String, f32)>,
    last_call: Option<DateTime<Utc>>,
}

impl DiameterStabilizer {
    pub fn new(window: usize, stale_after: Duration) -> Self {
        Self {
            stale_after,
            queue: CircularQueue::with_capacity(window),
            last_call: None,
        }
    }

    #[inline]
    pub fn window(&self) -> usize {
        self.queue.capacity()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, f32)> {
        self.queue.iter().map(|(id, v)| (id.as_str(), *v))
    }

    pub fn verify(&mut self, candidate: f32, logical_id: &str, now: DateTime<Utc>) -> f32 {
        if let Some(last) = self.last_call {
            if now - last > self.stale_after {
                debug!("stabilizer idle since {}, dropping history", last);
                self.queue.clear();
            }
        }
        self.last_call = Some(now);

        let present = self.queue.position(|(id, _)| id == logical_id);
        let history: Vec<f32> = self.queue.iter().map(|(_, v)| *v).collect();

        let value = if history.len() >= self.window() {
            math::majority(&history).unwrap_or(candidate)
        } else {
            candidate
        };

        match present.and_then(|idx| self.queue.get_mut(idx)) {
            Some(slot) => slot.1 = value,
            None => {
                self.queue.push((logical_id.to_string(), value));
            }
        }

        value
    }
}

impl From<&StabilizerConfig> for DiameterStabilizer {
    fn from(cfg: &StabilizerConfig) -> Self {
        Self::new(cfg.window, Duration::seconds(cfg.stale_after_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn stabilizer() -> DiameterStabilizer {
        DiameterStabilizer::new(5, Duration::seconds(7200))
    }

    #[test]
    fn passes_through_until_saturated() {
        let mut st = stabilizer();

        for (i, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            let value = 10.0 * (i + 1) as f32;
            assert_eq!(st.verify(value, id, t0()), value);
        }
        assert_eq!(st.len(), 5);
    }

    #[test]
    fn majority_overrides_candidate() {
        let mut st = stabilizer();
        for id in ["a", "b", "c", "d", "e"] {
            st.verify(50.0, id, t0());
        }

        assert_eq!(st.verify(75.0, "f", t0()), 50.0);
        assert_eq!(st.len(), 5);
        assert_eq!(st.entries().last(), Some(("f", 50.0)));
        assert_eq!(st.entries().next(), Some(("b", 50.0)));
    }

    #[test]
    fn tie_passes_candidate_unmodified() {
        let mut st = stabilizer();
        for (id, v) in [("a", 10.0), ("b", 10.0), ("c", 5.0), ("d", 5.0), ("e", 20.0)] {
            st.verify(v, id, t0());
        }

        assert_eq!(st.verify(30.0, "f", t0()), 30.0);
        assert_eq!(
            st.entries().collect::<Vec<_>>(),
            vec![("b", 10.0), ("c", 5.0), ("d", 5.0), ("e", 20.0), ("f", 30.0)]
        );
    }

    #[test]
    fn known_id_is_replaced_in_place() {
        let mut st = stabilizer();
        st.verify(10.0, "a", t0());
        st.verify(20.0, "b", t0());

        assert_eq!(st.verify(30.0, "a", t0()), 30.0);
        assert_eq!(
            st.entries().collect::<Vec<_>>(),
            vec![("a", 30.0), ("b", 20.0)]
        );
    }

    #[test]
    fn replaced_entry_still_votes() {
        let mut st = stabilizer();
        for (id, v) in [("a", 10.0), ("b", 10.0), ("c", 10.0), ("d", 5.0), ("e", 5.0)] {
            st.verify(v, id, t0());
        }

        // "a" re-measured: its old 10 still takes part in the vote
        assert_eq!(st.verify(5.0, "a", t0()), 10.0);
        assert_eq!(st.entries().next(), Some(("a", 10.0)));
    }

    #[test]
    fn long_gap_clears_history() {
        let mut st = stabilizer();
        for id in ["a", "b", "c", "d", "e"] {
            st.verify(50.0, id, t0());
        }

        let later = t0() + Duration::seconds(7201);
        assert_eq!(st.verify(75.0, "f", later), 75.0);
        assert_eq!(st.len(), 1);
    }

    #[test]
    fn gap_at_threshold_keeps_history() {
        let mut st = stabilizer();
        for id in ["a", "b", "c", "d", "e"] {
            st.verify(50.0, id, t0());
        }

        let later = t0() + Duration::seconds(7200);
        assert_eq!(st.verify(75.0, "f", later), 50.0);
    }
}
