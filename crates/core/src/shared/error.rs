use std::path::PathBuf;

use thiserror::Error;

use crate::inference::infrastructure::model_resolver::ModelResolveError;
use crate::shared::geometry::Size;

#[derive(Error, Debug)]
pub enum FaceAiError {
    #[error("a model path is required")]
    MissingModelPath,
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),
    #[error(transparent)]
    ModelResolve(#[from] ModelResolveError),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model declares no input tensor")]
    NoModelInput,
    #[error("{0} output tensors are not supported for SCRFD models")]
    UnsupportedOutputCount(usize),
    #[error("batched models are not supported")]
    BatchedModelUnsupported,
    #[error("model output {0} is missing")]
    MissingOutput(usize),
    #[error("tensor {name} holds {actual} values, expected {expected}")]
    TensorLength {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("image does not have the required dimensions (required: {required}, actual: {actual})")]
    ImageSizeMismatch { required: Size, actual: Size },
    #[error("exactly 5 landmarks are required, got {0}")]
    LandmarkCount(usize),
    #[error("could not invert alignment matrix")]
    SingularMatrix,
    #[error("landmarks are degenerate, no alignment can be estimated")]
    DegenerateLandmarks,
    #[error("no faces could be found in the given image")]
    NoFaceFound,
    #[error("facial landmarks are required but not given for all faces found")]
    MissingLandmarks,
    #[error("vector lengths differ: {0} vs {1}")]
    LengthMismatch(usize, usize),
    #[error("model produced an empty embedding")]
    EmptyEmbedding,
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Stringify a runtime error into [`FaceAiError::Inference`].
pub fn inference_error(e: impl std::fmt::Display) -> FaceAiError {
    FaceAiError::Inference(e.to_string())
}

pub type Result<T> = std::result::Result<T, FaceAiError>;
