//! Greedy non-maximum suppression over flat corner boxes.
//!
//! Box areas use the inclusive pixel convention `(x2 - x1 + 1) * (y2 - y1 + 1)`.
//! A candidate is discarded when its IoU with a kept box is strictly greater
//! than the threshold. Candidates must already be sorted by descending
//! confidence; ordering is the caller's policy.

use crate::detection::domain::detection::Detection;

fn area(b: &[f32; 4]) -> f32 {
    (b[2] - b[0] + 1.0) * (b[3] - b[1] + 1.0)
}

/// IoU of two `[x1, y1, x2, y2]` boxes with inclusive pixel areas.
pub fn inclusive_iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    inclusive_iou_with_areas(a, area(a), b, area(b))
}

fn inclusive_iou_with_areas(a: &[f32; 4], area_a: f32, b: &[f32; 4], area_b: f32) -> f32 {
    let w = (a[2].min(b[2]) - a[0].max(b[0]) + 1.0).max(0.0);
    let h = (a[3].min(b[3]) - a[1].max(b[1]) + 1.0).max(0.0);
    let inter = w * h;
    inter / (area_a + area_b - inter)
}

/// Indices of the boxes to keep, in input order.
pub fn non_max_suppression(boxes: &[[f32; 4]], iou_threshold: f32) -> Vec<usize> {
    let areas: Vec<f32> = boxes.iter().map(area).collect();
    let mut discarded = vec![false; boxes.len()];
    let mut keep = Vec::new();

    for i in 0..boxes.len() {
        if discarded[i] {
            continue;
        }
        keep.push(i);
        for j in (i + 1)..boxes.len() {
            if discarded[j] {
                continue;
            }
            if inclusive_iou_with_areas(&boxes[i], areas[i], &boxes[j], areas[j]) > iou_threshold {
                discarded[j] = true;
            }
        }
    }
    keep
}

/// [`non_max_suppression`] over detections sorted by descending confidence.
pub fn suppress(detections: &[Detection], iou_threshold: f32) -> Vec<usize> {
    let boxes: Vec<[f32; 4]> = detections.iter().map(Detection::corners).collect();
    non_max_suppression(&boxes, iou_threshold)
}
