/// SCRFD face detector over any [`InferenceEngine`].
///
/// Handles box-pad preprocessing, inference, per-stride decoding, global NMS
/// and scaling back to source-image coordinates.
use std::borrow::Cow;
use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;

use image::RgbImage;
use log::debug;

use crate::detection::domain::anchors::{AnchorCache, AnchorKey};
use crate::detection::domain::detection::{most_confident, Detection};
use crate::detection::domain::face_detector::{FaceDetector, FaceLandmarksDetector};
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::detection::domain::model_parameters::ModelParameters;
use crate::detection::domain::non_max_suppression::suppress;
use crate::detection::domain::stride_decoder::{decode_stride, StrideOutputs, BOX_VALUES, KEYPOINT_VALUES};
use crate::inference::domain::inference_engine::{InferenceEngine, NamedTensor};
use crate::inference::infrastructure::onnx_inference_engine::OnnxInferenceEngine;
use crate::shared::constants::DEFAULT_MAXIMUM_INPUT_SIZE;
use crate::shared::error::{FaceAiError, Result};
use crate::shared::geometry::{scale_factor_to_fit_into, Size};
use crate::shared::image_ops::{ensure_properly_sized, image_size, ResizeOptions};
use crate::shared::tensor::{image_to_tensor, Normalization};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.4;

/// Dynamic-input models get images padded up to a multiple of this.
const DYNAMIC_INPUT_ALIGNMENT: u32 = 32;

#[derive(Clone, Debug, PartialEq)]
pub struct ScrfdDetectorOptions {
    pub model_path: Option<PathBuf>,
    /// Resize images to the model input instead of failing on a mismatch.
    pub auto_resize_input_to_model_dimensions: bool,
    pub non_max_suppression_threshold: f32,
    pub confidence_threshold: f32,
    /// Upper bound for the inference input. Applies to dynamic models too.
    pub maximum_input_size: Option<Size>,
}

impl Default for ScrfdDetectorOptions {
    fn default() -> Self {
        Self {
            model_path: None,
            auto_resize_input_to_model_dimensions: true,
            non_max_suppression_threshold: DEFAULT_NMS_THRESHOLD,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            maximum_input_size: Some(DEFAULT_MAXIMUM_INPUT_SIZE),
        }
    }
}

impl ScrfdDetectorOptions {
    pub fn with_model_path(path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: Some(path.into()),
            ..Self::default()
        }
    }
}

pub struct ScrfdDetector {
    engine: Box<dyn InferenceEngine>,
    anchor_cache: Arc<AnchorCache>,
    parameters: ModelParameters,
    options: ScrfdDetectorOptions,
}

impl ScrfdDetector {
    /// Wrap an engine, discovering the model layout from its signature.
    ///
    /// Fails for output counts outside the known SCRFD layouts and for
    /// batched models.
    pub fn new(
        engine: Box<dyn InferenceEngine>,
        anchor_cache: Arc<AnchorCache>,
        options: ScrfdDetectorOptions,
    ) -> Result<Self> {
        let parameters = ModelParameters::discover(engine.inputs(), engine.outputs())?;
        Ok(Self {
            engine,
            anchor_cache,
            parameters,
            options,
        })
    }

    /// Load the ONNX model named in `options`, sharing the global anchor cache.
    pub fn from_options(options: ScrfdDetectorOptions) -> Result<Self> {
        let path = options
            .model_path
            .clone()
            .ok_or(FaceAiError::MissingModelPath)?;
        let engine = OnnxInferenceEngine::from_file(&path)?;
        Self::new(Box::new(engine), AnchorCache::global(), options)
    }

    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    pub fn options(&self) -> &ScrfdDetectorOptions {
        &self.options
    }

    /// Inference input size for an image of `image` size.
    pub fn target_input_size(&self, image: Size) -> Size {
        let target = self.parameters.input_size.unwrap_or_else(|| {
            Size::new(
                image.width.next_multiple_of(DYNAMIC_INPUT_ALIGNMENT),
                image.height.next_multiple_of(DYNAMIC_INPUT_ALIGNMENT),
            )
        });
        match self.options.maximum_input_size {
            Some(max) if target.width > max.width || target.height > max.height => max,
            _ => target,
        }
    }

    /// Run the model on a prepared `[1, 3, H, W]` tensor and decode the result.
    pub fn detect(&self, input: ndarray::Array4<f32>, input_size: Size, scale: f32) -> Result<Vec<Detection>> {
        let outputs = self.engine.run(input)?;
        self.decode(&outputs, input_size, scale)
    }

    /// Turn raw model outputs into detections in source-image coordinates.
    ///
    /// `input_size` is the tensor's spatial size; `scale` maps tensor pixels
    /// back onto the original image.
    pub fn decode(&self, outputs: &[NamedTensor], input_size: Size, scale: f32) -> Result<Vec<Detection>> {
        let params = &self.parameters;
        let mut candidates = Vec::new();

        for (si, &stride) in params.strides.iter().enumerate() {
            let key = AnchorKey::new(input_size, stride, params.anchors_per_cell);
            let anchors = self.anchor_cache.get_or_create(key);
            let anchor_count = anchors.len() / 2;

            let scores = output_values(outputs, params.score_output(si), anchor_count)?;
            let boxes = output_values(outputs, params.box_output(si), anchor_count * BOX_VALUES)?;
            let keypoints = params
                .keypoint_output(si)
                .map(|i| output_values(outputs, i, anchor_count * KEYPOINT_VALUES))
                .transpose()?;

            let stride_outputs = StrideOutputs {
                scores: &scores,
                box_offsets: &boxes,
                keypoint_offsets: keypoints.as_deref(),
            };
            let found = decode_stride(&stride_outputs, &anchors, stride, self.options.confidence_threshold);
            debug!("Stride {stride}: {} candidates", found.len());
            candidates.extend(found);
        }

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        // Stable, so equal scores keep stride order.
        candidates.sort_by(|a, b| {
            let ca = a.confidence.unwrap_or(0.0);
            let cb = b.confidence.unwrap_or(0.0);
            cb.partial_cmp(&ca).unwrap_or(Ordering::Equal)
        });
        let keep = suppress(&candidates, self.options.non_max_suppression_threshold);
        debug!("Kept {} of {} candidates after NMS", keep.len(), candidates.len());

        Ok(keep.into_iter().map(|i| candidates[i].scaled(scale)).collect())
    }
}

/// Flat values of output `index`, checked against the anchor grid.
fn output_values(outputs: &[NamedTensor], index: usize, expected: usize) -> Result<Cow<'_, [f32]>> {
    let tensor = outputs.get(index).ok_or(FaceAiError::MissingOutput(index))?;
    if tensor.len() != expected {
        return Err(FaceAiError::TensorLength {
            name: tensor.name.clone(),
            expected,
            actual: tensor.len(),
        });
    }
    Ok(match tensor.data.as_slice() {
        Some(values) => Cow::Borrowed(values),
        None => Cow::Owned(tensor.data.iter().copied().collect()),
    })
}

impl FaceDetector for ScrfdDetector {
    fn detect_faces(&self, image: &RgbImage) -> Result<Vec<Detection>> {
        let size = image_size(image);
        if size.is_empty() {
            return Ok(Vec::new());
        }

        let target = self.target_input_size(size);
        let resized = ensure_properly_sized(
            image,
            &ResizeOptions::box_pad_top_left(target),
            !self.options.auto_resize_input_to_model_dimensions,
        )?;
        let scale = 1.0 / scale_factor_to_fit_into(size, target);
        let tensor = image_to_tensor(&resized, &Normalization::SCRFD, false)?;
        self.detect(tensor, target, scale)
    }
}

impl FaceLandmarksDetector for ScrfdDetector {
    fn detect_landmarks(&self, image: &RgbImage) -> Result<Option<FaceLandmarks>> {
        let faces = self.detect_faces(image)?;
        Ok(most_confident(&faces).and_then(|f| f.landmarks))
    }
}
