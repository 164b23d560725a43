//! Ready-made tasks built from detectors and classifiers.

use image::RgbImage;
use log::debug;

use crate::detection::domain::detection::most_confident;
use crate::detection::domain::face_detector::{FaceDetector, FaceDetectorWithLandmarks};
use crate::eyes::domain::eye_boxes::eye_boxes_from_center_points;
use crate::eyes::domain::eye_state_detector::EyeStateDetector;
use crate::shared::constants::{MIN_EYE_BOX_EDGE, OPEN_CLOSED_EYE_INPUT_EDGE};
use crate::shared::error::{FaceAiError, Result};
use crate::shared::geometry::Rect;
use crate::shared::image_ops::{blur_region, crop_aligned, image_size};

pub const DEFAULT_BLUR_SIGMA_FACTOR: f32 = 10.0;
pub const DEFAULT_PROFILE_MAX_EDGE: u32 = 640;
pub const DEFAULT_PROFILE_SCALE_FACTOR: f64 = 1.35;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EyeStateCounts {
    pub faces: usize,
    pub open_eyes: usize,
    pub closed_eyes: usize,
}

/// Blur every detected face in place and return how many were found.
///
/// The gaussian sigma is `max(longest_edge / sigma_factor, sigma_factor)`.
pub fn blur_faces<D: FaceDetector + ?Sized>(detector: &D, image: &mut RgbImage, sigma_factor: f32) -> Result<usize> {
    let faces = detector.detect_faces(image)?;
    let bounds = Rect::from_size(image_size(image));
    for face in &faces {
        let r = face.bbox.round().intersect(&bounds);
        let longest = r.width.max(r.height) as f32;
        let sigma = (longest / sigma_factor).max(sigma_factor);
        blur_region(image, r, sigma);
    }
    debug!("Blurred {} faces", faces.len());
    Ok(faces.len())
}

/// Square, eye-levelled crop around the most confident face.
///
/// The face box is grown by `scale_factor` about its center and clamped to
/// the image. Fails with [`FaceAiError::NoFaceFound`] if there is no face.
pub fn crop_profile_picture<D: FaceDetector + ?Sized>(
    detector: &D,
    image: &RgbImage,
    max_edge: Option<u32>,
    scale_factor: f64,
) -> Result<RgbImage> {
    let faces = detector.detect_faces(image)?;
    let face = most_confident(&faces).ok_or(FaceAiError::NoFaceFound)?;

    let area = face
        .bbox
        .round()
        .scale_centered(scale_factor)
        .intersect(&Rect::from_size(image_size(image)));
    let angle = face.landmarks.map_or(0.0, |l| l.alignment_angle());
    crop_aligned(image, area, angle, max_edge)
}

pub fn count_faces<D: FaceDetector + ?Sized>(detector: &D, image: &RgbImage) -> Result<usize> {
    Ok(detector.detect_faces(image)?.len())
}

/// Count faces and classify both eyes of each.
///
/// Eyes with boxes narrower than 16 px are skipped, so `faces` may exceed
/// half the eye count. Every face must carry landmarks.
pub fn count_eye_states<D, E>(
    detector: &D,
    eye_state_detector: &E,
    image: &RgbImage,
    eye_distance_divisor: f32,
) -> Result<EyeStateCounts>
where
    D: FaceDetectorWithLandmarks + ?Sized,
    E: EyeStateDetector + ?Sized,
{
    let faces = detector.detect_faces(image)?;
    let mut counts = EyeStateCounts {
        faces: faces.len(),
        ..EyeStateCounts::default()
    };

    for face in &faces {
        let landmarks = face.landmarks.as_ref().ok_or(FaceAiError::MissingLandmarks)?;
        let left = detector.left_eye_center(landmarks);
        let right = detector.right_eye_center(landmarks);
        let angle = landmarks.alignment_angle();
        let boxes = eye_boxes_from_center_points(left, right, eye_distance_divisor);
        if boxes.min_edge() < MIN_EYE_BOX_EDGE {
            continue;
        }

        for eye in [boxes.left, boxes.right] {
            let crop = crop_aligned(image, eye, angle, Some(OPEN_CLOSED_EYE_INPUT_EDGE))?;
            if eye_state_detector.is_open(&crop)? {
                counts.open_eyes += 1;
            } else {
                counts.closed_eyes += 1;
            }
        }
    }
    Ok(counts)
}
