use log::trace;
use nalgebra as na;
use std::collections::{HashMap, HashSet};

use crate::bbox::{BBox, Ltrb};
use crate::config::LineConfig;
use crate::detection::TrackId;

/// Directed reference line; `is_in` is the orientation test against it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceLine {
    pub start: na::Point2<f32>,
    pub end: na::Point2<f32>,
}

impl ReferenceLine {
    pub fn new(start: na::Point2<f32>, end: na::Point2<f32>) -> Self {
        Self { start, end }
    }

    /// Only `start.x` is used for straddle and right-of-line tests.
    #[inline]
    pub fn cross_line(&self) -> f32 {
        self.start.x
    }

    #[inline]
    pub fn is_in(&self, p: &na::Point2<f32>) -> bool {
        let v = self.end.coords - self.start.coords;
        let d = p.coords - self.start.coords;

        v.x * d.y - v.y * d.x < 0.0
    }

    /// Side of a point just right of the crossing x.
    #[inline]
    pub fn approach_side(&self) -> bool {
        self.is_in(&na::Point2::new(self.cross_line() + 1.0, self.start.y))
    }

    /// Common side of all four anchors, `None` when they disagree.
    pub fn side_of(&self, bbox: &BBox<Ltrb>) -> Option<bool> {
        let mut sides = bbox.anchors().map(|a| self.is_in(&a)).into_iter();
        let first = sides.next()?;

        sides.all(|s| s == first).then_some(first)
    }
}

impl From<&LineConfig> for ReferenceLine {
    fn from(cfg: &LineConfig) -> Self {
        Self::new(
            na::Point2::new(cfg.start[0], cfg.start[1]),
            na::Point2::new(cfg.end[0], cfg.end[1]),
        )
    }
}

/// Outcome of classifying one detection against the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Crossing {
    pub crossed: bool,
    pub track_id: Option<TrackId>,
    pub dwell_count: u32,
    pub straddling: bool,
    /// Track returned to the approach side after having left it.
    pub reversed: bool,
}

#[derive(Debug, Clone)]
pub struct CrossingDetector {
    line: ReferenceLine,
    approach_side: bool,
    dwell_threshold: u32,
    sides: HashMap<TrackId, bool>,
    right_side: HashSet<TrackId>,
    dwell_track_id: Option<TrackId>,
    dwell_count: u32,
}

impl CrossingDetector {
    pub fn new(line: ReferenceLine, dwell_threshold: u32) -> Self {
        Self {
            approach_side: line.approach_side(),
            line,
            dwell_threshold,
            sides: HashMap::new(),
            right_side: HashSet::new(),
            dwell_track_id: None,
            dwell_count: 0,
        }
    }

    #[inline]
    pub fn is_right_side_member(&self, track_id: TrackId) -> bool {
        self.right_side.contains(&track_id)
    }

    #[inline]
    pub fn side(&self, track_id: TrackId) -> Option<bool> {
        self.sides.get(&track_id).copied()
    }

    pub fn classify(&mut self, track_id: Option<TrackId>, bbox: &BBox<Ltrb>) -> Crossing {
        let id = match track_id {
            Some(id) => id,
            None => return Crossing::default(),
        };

        let cross_line = self.line.cross_line();
        let mut result = Crossing {
            track_id: Some(id),
            reversed: self.update_side(id, bbox),
            ..Default::default()
        };

        if bbox.straddles(cross_line) {
            if self.dwell_track_id != Some(id) {
                self.dwell_track_id = Some(id);
                self.dwell_count = 0;
            }

            self.dwell_count += 1;
            trace!("track {} straddling for {} frames", id, self.dwell_count);

            result.straddling = true;
            result.dwell_count = self.dwell_count;
            result.crossed =
                self.dwell_count > self.dwell_threshold && self.right_side.contains(&id);
        } else if bbox.is_right_of(cross_line) {
            self.right_side.insert(id);
        }

        result
    }

    /// Forgets per-track sides and dwell; right-side membership is kept.
    pub fn reset_tracks(&mut self) {
        self.sides.clear();
        self.dwell_track_id = None;
        self.dwell_count = 0;
    }

    fn update_side(&mut self, id: TrackId, bbox: &BBox<Ltrb>) -> bool {
        let side = match self.line.side_of(bbox) {
            Some(side) => side,
            None => return false,
        };

        match self.sides.insert(id, side) {
            Some(prev) => prev != side && side == self.approach_side,
            None => false,
        }
    }
}
