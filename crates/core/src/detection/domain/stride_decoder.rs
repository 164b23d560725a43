//! Decoding of one feature-pyramid level into candidate detections.
//!
//! Offsets are predicted in stride units. Box offsets are distances from the
//! anchor to the left, top, right and bottom edges; keypoint offsets are
//! `(dx, dy)` pairs relative to the anchor.

use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_landmarks::{FaceLandmarks, LANDMARK_COUNT};
use crate::shared::geometry::{PointF, RectF};

pub const BOX_VALUES: usize = 4;
pub const KEYPOINT_VALUES: usize = LANDMARK_COUNT * 2;

/// Raw model outputs of one stride, one score per anchor.
#[derive(Clone, Copy, Debug)]
pub struct StrideOutputs<'a> {
    pub scores: &'a [f32],
    pub box_offsets: &'a [f32],
    pub keypoint_offsets: Option<&'a [f32]>,
}

/// Indices of anchors whose score reaches `threshold` (inclusive).
pub fn positive_indices(scores: &[f32], threshold: f32) -> Vec<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, s)| **s >= threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Decode every anchor scoring at least `confidence_threshold`.
///
/// `anchors` is the flat center grid for this stride. All buffers must agree
/// in anchor count; a mismatch is a programming error and panics. Returns an
/// empty list when nothing passes the threshold.
pub fn decode_stride(
    outputs: &StrideOutputs<'_>,
    anchors: &[f32],
    stride: u32,
    confidence_threshold: f32,
) -> Vec<Detection> {
    let n = outputs.scores.len();
    assert_eq!(anchors.len(), n * 2, "anchor grid does not match score count");
    assert_eq!(
        outputs.box_offsets.len(),
        n * BOX_VALUES,
        "box offsets do not match score count"
    );
    if let Some(kps) = outputs.keypoint_offsets {
        assert_eq!(
            kps.len(),
            n * KEYPOINT_VALUES,
            "keypoint offsets do not match score count"
        );
    }

    let stride = stride as f32;
    positive_indices(outputs.scores, confidence_threshold)
        .into_iter()
        .map(|i| {
            let anchor = PointF::new(anchors[2 * i], anchors[2 * i + 1]);
            let o = &outputs.box_offsets[i * BOX_VALUES..(i + 1) * BOX_VALUES];
            let bbox = RectF::from_corners(
                anchor.x - o[0] * stride,
                anchor.y - o[1] * stride,
                anchor.x + o[2] * stride,
                anchor.y + o[3] * stride,
            );
            let landmarks = outputs.keypoint_offsets.map(|kps| {
                let k = &kps[i * KEYPOINT_VALUES..(i + 1) * KEYPOINT_VALUES];
                decode_keypoints(k, anchor, stride)
            });
            Detection::new(bbox, landmarks, Some(outputs.scores[i]))
        })
        .collect()
}

fn decode_keypoints(offsets: &[f32], anchor: PointF, stride: f32) -> FaceLandmarks {
    let mut points = [PointF::default(); LANDMARK_COUNT];
    for (k, p) in points.iter_mut().enumerate() {
        *p = anchor.offset(offsets[2 * k] * stride, offsets[2 * k + 1] * stride);
    }
    FaceLandmarks::new(points)
}
