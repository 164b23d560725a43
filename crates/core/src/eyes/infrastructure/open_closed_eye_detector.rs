/// Open/closed eye classifier for 32x32 BGR eye crops.
use std::path::PathBuf;

use image::RgbImage;

use crate::eyes::domain::eye_state_detector::EyeStateDetector;
use crate::inference::domain::inference_engine::InferenceEngine;
use crate::inference::infrastructure::onnx_inference_engine::OnnxInferenceEngine;
use crate::shared::constants::OPEN_CLOSED_EYE_INPUT_EDGE;
use crate::shared::error::{FaceAiError, Result};
use crate::shared::geometry::Size;
use crate::shared::image_ops::{ensure_properly_sized, ResizeOptions};
use crate::shared::tensor::{image_to_tensor, Normalization};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenClosedEyeOptions {
    pub model_path: Option<PathBuf>,
    pub auto_resize_input_to_model_dimensions: bool,
}

impl Default for OpenClosedEyeOptions {
    fn default() -> Self {
        Self {
            model_path: None,
            auto_resize_input_to_model_dimensions: true,
        }
    }
}

impl OpenClosedEyeOptions {
    pub fn with_model_path(path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: Some(path.into()),
            ..Self::default()
        }
    }
}

pub struct OpenClosedEyeDetector {
    engine: Box<dyn InferenceEngine>,
    options: OpenClosedEyeOptions,
}

impl OpenClosedEyeDetector {
    pub fn new(engine: Box<dyn InferenceEngine>, options: OpenClosedEyeOptions) -> Result<Self> {
        if engine.inputs().is_empty() {
            return Err(FaceAiError::NoModelInput);
        }
        Ok(Self { engine, options })
    }

    pub fn from_options(options: OpenClosedEyeOptions) -> Result<Self> {
        let path = options
            .model_path
            .clone()
            .ok_or(FaceAiError::MissingModelPath)?;
        let engine = OnnxInferenceEngine::from_file(&path)?;
        Self::new(Box::new(engine), options)
    }
}

impl EyeStateDetector for OpenClosedEyeDetector {
    /// The model outputs `[closed, open]` probabilities; the eye counts as
    /// open when the second is larger.
    fn is_open(&self, eye_image: &RgbImage) -> Result<bool> {
        let input = ensure_properly_sized(
            eye_image,
            &ResizeOptions::pad_centered(Size::square(OPEN_CLOSED_EYE_INPUT_EDGE)),
            !self.options.auto_resize_input_to_model_dimensions,
        )?;
        let tensor = image_to_tensor(&input, &Normalization::OPEN_CLOSED_EYE, true)?;
        let outputs = self.engine.run(tensor)?;

        let first = outputs.first().ok_or(FaceAiError::MissingOutput(0))?;
        let mut values = first.data.iter().copied();
        match (values.next(), values.next()) {
            (Some(closed), Some(open)) => Ok(closed < open),
            _ => Err(FaceAiError::TensorLength {
                name: first.name.clone(),
                expected: 2,
                actual: first.len(),
            }),
        }
    }
}
