//! 5-point face landmarks in fixed semantic order: left eye, right eye, nose,
//! left mouth corner, right mouth corner.

use crate::shared::error::FaceAiError;
use crate::shared::geometry::PointF;

pub const LANDMARK_COUNT: usize = 5;

const LEFT_EYE: usize = 0;
const RIGHT_EYE: usize = 1;
const NOSE: usize = 2;
const MOUTH_LEFT: usize = 3;
const MOUTH_RIGHT: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: [PointF; LANDMARK_COUNT],
}

impl FaceLandmarks {
    pub const fn new(points: [PointF; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[PointF; LANDMARK_COUNT] {
        &self.points
    }

    pub fn left_eye(&self) -> PointF {
        self.points[LEFT_EYE]
    }

    pub fn right_eye(&self) -> PointF {
        self.points[RIGHT_EYE]
    }

    pub fn nose(&self) -> PointF {
        self.points[NOSE]
    }

    pub fn mouth_left(&self) -> PointF {
        self.points[MOUTH_LEFT]
    }

    pub fn mouth_right(&self) -> PointF {
        self.points[MOUTH_RIGHT]
    }

    pub fn scaled(&self, factor: f32) -> FaceLandmarks {
        FaceLandmarks::new(self.points.map(|p| p.scaled(factor)))
    }

    /// Rotation in degrees that makes the eye line horizontal.
    pub fn alignment_angle(&self) -> f32 {
        alignment_angle(self.left_eye(), self.right_eye())
    }
}

/// Degrees to rotate by (clockwise positive, y down) so that `right_eye`
/// ends up level with `left_eye`.
pub fn alignment_angle(left_eye: PointF, right_eye: PointF) -> f32 {
    let dy = (right_eye.y - left_eye.y) as f64;
    let dx = (right_eye.x - left_eye.x) as f64;
    (-dy.atan2(dx).to_degrees()) as f32
}

impl TryFrom<&[PointF]> for FaceLandmarks {
    type Error = FaceAiError;

    fn try_from(points: &[PointF]) -> Result<Self, Self::Error> {
        let points: [PointF; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| FaceAiError::LandmarkCount(points.len()))?;
        Ok(Self::new(points))
    }
}

impl TryFrom<Vec<PointF>> for FaceLandmarks {
    type Error = FaceAiError;

    fn try_from(points: Vec<PointF>) -> Result<Self, Self::Error> {
        FaceLandmarks::try_from(points.as_slice())
    }
}
