use crate::shared::geometry::{PointF, Rect};

/// Eye-to-eye distance divided by this gives half the eye box edge.
pub const DEFAULT_EYE_DISTANCE_DIVISOR: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EyeBoxes {
    pub left: Rect,
    pub right: Rect,
}

impl EyeBoxes {
    pub fn min_edge(&self) -> i32 {
        self.left.width.min(self.right.width)
    }
}

/// Square boxes around both eye centers.
///
/// A larger `distance_divisor` gives smaller boxes: the edge is
/// `trunc(distance / divisor) * 2`.
pub fn eye_boxes_from_center_points(left_eye: PointF, right_eye: PointF, distance_divisor: f32) -> EyeBoxes {
    let half = left_eye.distance(&right_eye) / distance_divisor;
    let edge = half as i32 * 2;
    let square_at = |center: PointF| {
        let (x, y) = center.offset(-half, -half).round();
        Rect::new(x, y, edge, edge)
    };
    EyeBoxes {
        left: square_at(left_eye),
        right: square_at(right_eye),
    }
}
