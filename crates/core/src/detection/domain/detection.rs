use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::geometry::RectF;

/// A detected face in image-pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: RectF,
    pub landmarks: Option<FaceLandmarks>,
    /// In `[0, 1]` when the detector reports one.
    pub confidence: Option<f32>,
}

impl Detection {
    pub fn new(bbox: RectF, landmarks: Option<FaceLandmarks>, confidence: Option<f32>) -> Self {
        Self {
            bbox,
            landmarks,
            confidence,
        }
    }

    /// `[x1, y1, x2, y2]`
    pub fn corners(&self) -> [f32; 4] {
        self.bbox.corners()
    }

    /// Box and landmarks multiplied by `factor`; confidence is unchanged.
    pub fn scaled(&self, factor: f32) -> Detection {
        Detection {
            bbox: self.bbox.scaled(factor),
            landmarks: self.landmarks.map(|l| l.scaled(factor)),
            confidence: self.confidence,
        }
    }
}

/// The detection with the highest confidence. Missing confidences rank lowest.
pub fn most_confident(detections: &[Detection]) -> Option<&Detection> {
    detections.iter().max_by(|a, b| {
        let ca = a.confidence.unwrap_or(f32::NEG_INFINITY);
        let cb = b.confidence.unwrap_or(f32::NEG_INFINITY);
        ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
    })
}
