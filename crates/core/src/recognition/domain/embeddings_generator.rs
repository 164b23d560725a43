use image::RgbImage;

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::error::Result;

/// Domain interface for face embedding models.
///
/// Faces are aligned first and then embedded. Embeddings are unit length, so
/// their dot product is the cosine similarity.
pub trait FaceEmbeddingsGenerator: Send + Sync {
    /// Crop the face described by `landmarks` into the canonical pose, as an
    /// `edge_size x edge_size` image.
    fn align_face(&self, image: &RgbImage, landmarks: &FaceLandmarks, edge_size: u32) -> Result<RgbImage>;

    fn generate(&self, aligned_face: &RgbImage) -> Result<Vec<f32>>;
}
