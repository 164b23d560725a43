use std::time::Duration;

use crate::shared::geometry::{PointF, Size};

pub const SCRFD_MODEL_NAME: &str = "scrfd_2.5g_kps.onnx";
pub const ARCFACE_MODEL_NAME: &str = "arcfaceresnet100-11-int8.onnx";
pub const OPEN_CLOSED_EYE_MODEL_NAME: &str = "open_closed_eye.onnx";

/// Edge length of the reference frame the canonical landmarks live in.
pub const ARCFACE_INPUT_EDGE: u32 = 112;

/// Canonical ArcFace landmark positions: left eye, right eye, nose,
/// mouth left, mouth right.
pub const ARCFACE_CANONICAL_LANDMARKS: [PointF; 5] = [
    PointF::new(38.2946, 51.6963),
    PointF::new(73.5318, 51.5014),
    PointF::new(56.0252, 71.7366),
    PointF::new(41.5493, 92.3655),
    PointF::new(70.7299, 92.2041),
];

pub const OPEN_CLOSED_EYE_INPUT_EDGE: u32 = 32;

/// Eyes whose boxes are narrower than this are not classified.
pub const MIN_EYE_BOX_EDGE: i32 = 16;

pub const DEFAULT_MAXIMUM_INPUT_SIZE: Size = Size::new(640, 640);

/// Inactivity after which a cached anchor grid is dropped.
pub const DEFAULT_ANCHOR_SLIDING_EXPIRATION: Duration = Duration::from_secs(20 * 60);

/// Bounded capacity of the aligned-face queue in batch embedding runs.
pub const DEFAULT_BATCH_QUEUE_CAPACITY: usize = 10;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
