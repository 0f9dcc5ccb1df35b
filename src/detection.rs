use ndarray::Array2;

use crate::bbox::{BBox, Ltrb, Xywh};

pub type TrackId = u32;

/// One tracked object in one frame, as produced by the external tracker.
#[derive(Debug, Clone)]
pub struct Detection {
    /// `None` until the tracker has confirmed an identity.
    pub track_id: Option<TrackId>,
    pub bbox: BBox<Ltrb>,
    /// Segmentation mask at (cropped) frame resolution, rows x cols.
    pub mask: Option<Array2<bool>>,
    pub confidence: f32,
    pub class: i32,
}

impl Detection {
    pub fn new(track_id: Option<TrackId>, bbox: BBox<Ltrb>) -> Self {
        Self {
            track_id,
            bbox,
            mask: None,
            confidence: 1.0,
            class: 0,
        }
    }

    #[inline]
    pub fn from_xywh(track_id: Option<TrackId>, bbox: &BBox<Xywh>) -> Self {
        Self::new(track_id, bbox.as_ltrb())
    }

    pub fn with_mask(mut self, mask: Array2<bool>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_class(mut self, class: i32, confidence: f32) -> Self {
        self.class = class;
        self.confidence = confidence;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_center_format() {
        let det = Detection::from_xywh(Some(4), &BBox::xywh(100.0, 30.0, 40.0, 20.0))
            .with_class(2, 0.8)
            .with_mask(Array2::from_elem((8, 8), true));

        assert_eq!(det.bbox.as_slice(), &[80.0, 20.0, 120.0, 40.0]);
        assert!(det.bbox.straddles(100.0));
        assert_eq!((det.class, det.confidence), (2, 0.8));
        assert_eq!(det.mask.map(|m| m.dim()), Some((8, 8)));
    }
}
