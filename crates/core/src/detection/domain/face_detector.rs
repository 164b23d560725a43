use image::RgbImage;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::error::Result;
use crate::shared::geometry::PointF;

/// Domain interface for face detection.
///
/// Detection takes `&self` so that one detector can serve several threads.
/// An image without faces yields an empty list, never an error.
pub trait FaceDetector: Send + Sync {
    fn detect_faces(&self, image: &RgbImage) -> Result<Vec<Detection>>;
}

/// Capability of locating the 5 facial landmarks.
pub trait FaceLandmarksDetector: Send + Sync {
    /// Landmarks of the most confident face, if any face has them.
    fn detect_landmarks(&self, image: &RgbImage) -> Result<Option<FaceLandmarks>>;

    fn left_eye_center(&self, landmarks: &FaceLandmarks) -> PointF {
        landmarks.left_eye()
    }

    fn right_eye_center(&self, landmarks: &FaceLandmarks) -> PointF {
        landmarks.right_eye()
    }
}

/// Detector that reports boxes and landmarks together.
pub trait FaceDetectorWithLandmarks: FaceDetector + FaceLandmarksDetector {}

impl<T: FaceDetector + FaceLandmarksDetector + ?Sized> FaceDetectorWithLandmarks for T {}
