mod common;

use std::path::PathBuf;
use std::sync::Arc;

use approx::assert_relative_eq;
use common::{init_logging, FakeScrfdEngine, Peak};
use faceai_core::detection::domain::anchors::AnchorCache;
use faceai_core::detection::domain::face_detector::{FaceDetector, FaceLandmarksDetector};
use faceai_core::detection::infrastructure::scrfd_detector::{ScrfdDetector, ScrfdDetectorOptions};
use faceai_core::shared::error::FaceAiError;
use faceai_core::shared::geometry::{RectF, Size};
use image::{Rgb, RgbImage};

/// Large face at stride 32, the same face again at stride 16, and a small
/// face at stride 8.
fn planted_peaks() -> Vec<Peak> {
    vec![
        Peak {
            stride_index: 2,
            cell: (10, 5),
            score: 0.87,
            box_offsets: [2.0; 4],
        },
        Peak {
            stride_index: 1,
            cell: (20, 10),
            score: 0.7,
            box_offsets: [4.0; 4],
        },
        Peak {
            stride_index: 0,
            cell: (10, 40),
            score: 0.6,
            box_offsets: [2.0; 4],
        },
    ]
}

fn detector(peaks: &[Peak]) -> ScrfdDetector {
    ScrfdDetector::new(
        Box::new(FakeScrfdEngine::new(peaks)),
        Arc::new(AnchorCache::default()),
        ScrfdDetectorOptions::default(),
    )
    .unwrap()
}

#[test]
fn blank_image_has_no_faces() {
    init_logging();
    let d = detector(&[]);
    let faces = d.detect_faces(&RgbImage::from_pixel(640, 640, Rgb([128, 128, 128]))).unwrap();
    assert!(faces.is_empty());
}

#[test]
fn model_layout_is_discovered() {
    let d = detector(&[]);
    let p = d.parameters();
    assert_eq!(p.strides, vec![8, 16, 32]);
    assert_eq!(p.anchors_per_cell, 2);
    assert!(p.use_keypoints);
    assert_eq!(p.input_size, Some(Size::square(640)));
}

#[test]
fn detections_come_back_in_image_coordinates() {
    init_logging();
    let d = detector(&planted_peaks());
    // 1280x960 fits into 640x640 at half size
    let faces = d.detect_faces(&RgbImage::new(1280, 960)).unwrap();

    assert_eq!(faces.len(), 2, "duplicate at stride 16 must be suppressed");
    assert_eq!(faces[0].confidence, Some(0.87));
    assert_eq!(faces[0].bbox, RectF::new(512.0, 192.0, 256.0, 256.0));
    assert_eq!(faces[1].confidence, Some(0.6));
    assert_eq!(faces[1].bbox, RectF::new(128.0, 608.0, 64.0, 64.0));

    let lm = faces[0].landmarks.unwrap();
    assert_relative_eq!(lm.left_eye().x, 576.0);
    assert_relative_eq!(lm.left_eye().y, 288.0);
    assert_relative_eq!(lm.nose().x, 640.0);
    assert_relative_eq!(lm.mouth_right().y, 384.0);
}

#[test]
fn landmarks_of_most_confident_face() {
    let d = detector(&planted_peaks());
    let lm = d.detect_landmarks(&RgbImage::new(640, 640)).unwrap().unwrap();
    assert_relative_eq!(lm.right_eye().x, 352.0);
    assert_relative_eq!(lm.right_eye().y, 144.0);
}

#[test]
fn confidence_threshold_filters_candidates() {
    let options = ScrfdDetectorOptions {
        confidence_threshold: 0.8,
        ..ScrfdDetectorOptions::default()
    };
    let d = ScrfdDetector::new(
        Box::new(FakeScrfdEngine::new(&planted_peaks())),
        AnchorCache::global(),
        options,
    )
    .unwrap();
    let faces = d.detect_faces(&RgbImage::new(640, 640)).unwrap();
    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].confidence, Some(0.87));
}

#[test]
fn unsupported_output_count_is_rejected() {
    let engine = FakeScrfdEngine::with_output_count(&[], 7);
    let err = ScrfdDetector::new(Box::new(engine), Arc::new(AnchorCache::default()), ScrfdDetectorOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err, FaceAiError::UnsupportedOutputCount(7)));
}

#[test]
fn six_output_layout_has_no_landmarks() {
    let engine = FakeScrfdEngine::with_output_count(&planted_peaks(), 6);
    let d = ScrfdDetector::new(Box::new(engine), Arc::new(AnchorCache::default()), ScrfdDetectorOptions::default())
        .unwrap();
    let faces = d.detect_faces(&RgbImage::new(640, 640)).unwrap();
    assert_eq!(faces.len(), 2);
    assert!(faces.iter().all(|f| f.landmarks.is_none()));
}

#[test]
#[ignore] // Requires an SCRFD model file in SCRFD_MODEL_PATH
fn real_model_finds_nothing_in_flat_image() {
    init_logging();
    let path = PathBuf::from(std::env::var("SCRFD_MODEL_PATH").expect("SCRFD_MODEL_PATH not set"));
    let d = ScrfdDetector::from_options(ScrfdDetectorOptions::with_model_path(path)).unwrap();
    assert!(d.parameters().use_keypoints);

    let faces = d.detect_faces(&RgbImage::from_pixel(800, 600, Rgb([127, 127, 127]))).unwrap();
    assert!(faces.is_empty());
}
