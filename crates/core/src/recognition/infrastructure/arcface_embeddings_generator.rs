/// ArcFace embeddings over any [`InferenceEngine`].
///
/// Expects 112x112 aligned faces and returns the first model output scaled to
/// unit length.
use std::path::PathBuf;

use image::RgbImage;
use log::debug;

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::inference::domain::inference_engine::InferenceEngine;
use crate::inference::infrastructure::onnx_inference_engine::OnnxInferenceEngine;
use crate::recognition::domain::alignment::{align_using_facial_landmarks, TransformModel};
use crate::recognition::domain::embeddings_generator::FaceEmbeddingsGenerator;
use crate::shared::constants::ARCFACE_INPUT_EDGE;
use crate::shared::error::{FaceAiError, Result};
use crate::shared::geometry::Size;
use crate::shared::image_ops::{ensure_properly_sized, ResizeOptions};
use crate::shared::tensor::{image_to_tensor, Normalization};
use crate::shared::vector_math::l2_normalize;

#[derive(Clone, Debug, PartialEq)]
pub struct ArcFaceOptions {
    pub model_path: Option<PathBuf>,
    pub auto_resize_input_to_model_dimensions: bool,
    pub transform: TransformModel,
}

impl Default for ArcFaceOptions {
    fn default() -> Self {
        Self {
            model_path: None,
            auto_resize_input_to_model_dimensions: true,
            transform: TransformModel::default(),
        }
    }
}

impl ArcFaceOptions {
    pub fn with_model_path(path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: Some(path.into()),
            ..Self::default()
        }
    }
}

pub struct ArcFaceEmbeddingsGenerator {
    engine: Box<dyn InferenceEngine>,
    options: ArcFaceOptions,
}

impl ArcFaceEmbeddingsGenerator {
    pub fn new(engine: Box<dyn InferenceEngine>, options: ArcFaceOptions) -> Result<Self> {
        if engine.inputs().is_empty() {
            return Err(FaceAiError::NoModelInput);
        }
        Ok(Self { engine, options })
    }

    pub fn from_options(options: ArcFaceOptions) -> Result<Self> {
        let path = options
            .model_path
            .clone()
            .ok_or(FaceAiError::MissingModelPath)?;
        let engine = OnnxInferenceEngine::from_file(&path)?;
        Self::new(Box::new(engine), options)
    }

    pub fn options(&self) -> &ArcFaceOptions {
        &self.options
    }
}

impl FaceEmbeddingsGenerator for ArcFaceEmbeddingsGenerator {
    fn align_face(&self, image: &RgbImage, landmarks: &FaceLandmarks, edge_size: u32) -> Result<RgbImage> {
        align_using_facial_landmarks(image, landmarks, edge_size, self.options.transform)
    }

    fn generate(&self, aligned_face: &RgbImage) -> Result<Vec<f32>> {
        let input = ensure_properly_sized(
            aligned_face,
            &ResizeOptions::pad_centered(Size::square(ARCFACE_INPUT_EDGE)),
            !self.options.auto_resize_input_to_model_dimensions,
        )?;
        let tensor = image_to_tensor(&input, &Normalization::ARCFACE, false)?;
        let outputs = self.engine.run(tensor)?;

        let first = outputs.first().ok_or(FaceAiError::MissingOutput(0))?;
        let mut embedding: Vec<f32> = first.data.iter().copied().collect();
        if embedding.is_empty() {
            return Err(FaceAiError::EmptyEmbedding);
        }
        l2_normalize(&mut embedding);
        debug!("Generated {}-dimensional embedding", embedding.len());
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::domain::inference_engine::{NamedTensor, TensorInfo};
    use crate::shared::constants::ARCFACE_CANONICAL_LANDMARKS;
    use approx::assert_relative_eq;
    use image::Rgb;
    use ndarray::{Array4, ArrayD, IxDyn};

    /// Echoes the mean of each input channel as a 3-value embedding.
    struct ChannelMeanEngine {
        inputs: Vec<TensorInfo>,
        outputs: Vec<TensorInfo>,
    }

    impl ChannelMeanEngine {
        fn new() -> Self {
            Self {
                inputs: vec![TensorInfo::new("data", vec![1, 3, 112, 112])],
                outputs: vec![TensorInfo::new("fc1", vec![1, 3])],
            }
        }
    }

    impl InferenceEngine for ChannelMeanEngine {
        fn inputs(&self) -> &[TensorInfo] {
            &self.inputs
        }

        fn outputs(&self) -> &[TensorInfo] {
            &self.outputs
        }

        fn run(&self, input: Array4<f32>) -> Result<Vec<NamedTensor>> {
            assert_eq!(input.shape(), &[1, 3, 112, 112]);
            let means: Vec<f32> = (0..3)
                .map(|c| input.index_axis(ndarray::Axis(1), c).mean().unwrap_or(0.0))
                .collect();
            let data = ArrayD::from_shape_vec(IxDyn(&[1, 3]), means).unwrap();
            Ok(vec![NamedTensor::new("fc1", data)])
        }
    }

    struct EmptyOutputEngine(Vec<TensorInfo>);

    impl InferenceEngine for EmptyOutputEngine {
        fn inputs(&self) -> &[TensorInfo] {
            &self.0
        }

        fn outputs(&self) -> &[TensorInfo] {
            &[]
        }

        fn run(&self, _input: Array4<f32>) -> Result<Vec<NamedTensor>> {
            Ok(vec![NamedTensor::new("fc1", ArrayD::zeros(IxDyn(&[1, 0])))])
        }
    }

    fn generator(options: ArcFaceOptions) -> ArcFaceEmbeddingsGenerator {
        ArcFaceEmbeddingsGenerator::new(Box::new(ChannelMeanEngine::new()), options).unwrap()
    }

    #[test]
    fn test_embedding_is_unit_length_raw_pixel_direction() {
        let g = generator(ArcFaceOptions::default());
        let face = RgbImage::from_pixel(112, 112, Rgb([30, 40, 0]));
        let e = g.generate(&face).unwrap();
        // raw values are kept, so the direction is (30, 40, 0)
        assert_relative_eq!(e[0], 0.6, epsilon = 1e-5);
        assert_relative_eq!(e[1], 0.8, epsilon = 1e-5);
        assert_relative_eq!(e[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_wrong_size_is_padded_when_allowed() {
        let g = generator(ArcFaceOptions::default());
        let e = g.generate(&RgbImage::from_pixel(56, 112, Rgb([10, 10, 10]))).unwrap();
        let norm: f32 = e.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_wrong_size_fails_without_auto_resize() {
        let g = generator(ArcFaceOptions {
            auto_resize_input_to_model_dimensions: false,
            ..ArcFaceOptions::default()
        });
        let err = g.generate(&RgbImage::new(100, 100)).unwrap_err();
        assert!(matches!(
            err,
            FaceAiError::ImageSizeMismatch { required, .. } if required == Size::square(112)
        ));
    }

    #[test]
    fn test_empty_output_is_an_error() {
        let engine = EmptyOutputEngine(vec![TensorInfo::new("data", vec![1, 3, 112, 112])]);
        let g = ArcFaceEmbeddingsGenerator::new(Box::new(engine), ArcFaceOptions::default()).unwrap();
        let err = g.generate(&RgbImage::new(112, 112)).unwrap_err();
        assert!(matches!(err, FaceAiError::EmptyEmbedding));
    }

    #[test]
    fn test_engine_without_input_is_rejected() {
        let err = ArcFaceEmbeddingsGenerator::new(Box::new(EmptyOutputEngine(Vec::new())), ArcFaceOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, FaceAiError::NoModelInput));
    }

    #[test]
    fn test_from_options_requires_model_path() {
        let err = ArcFaceEmbeddingsGenerator::from_options(ArcFaceOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, FaceAiError::MissingModelPath));
    }

    #[test]
    fn test_align_face_uses_configured_edge() {
        let g = generator(ArcFaceOptions {
            transform: TransformModel::Similarity,
            ..ArcFaceOptions::default()
        });
        let landmarks = FaceLandmarks::new(ARCFACE_CANONICAL_LANDMARKS.map(|p| p.offset(50.0, 50.0)));
        let aligned = g
            .align_face(&RgbImage::from_pixel(300, 300, Rgb([99, 99, 99])), &landmarks, 112)
            .unwrap();
        assert_eq!(aligned.dimensions(), (112, 112));
        assert!(g.generate(&aligned).is_ok());
    }
}
