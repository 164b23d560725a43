/// ONNX Runtime-backed inference engine.
///
/// The session is guarded by a `Mutex` because `Session::run` needs `&mut`;
/// the engine itself is shared by reference between detector callers.
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use log::info;
use ndarray::Array4;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;

use super::execution_provider::preferred_execution_providers;
use crate::inference::domain::inference_engine::{InferenceEngine, NamedTensor, TensorInfo};
use crate::shared::error::{inference_error, FaceAiError, Result};

pub struct OnnxInferenceEngine {
    session: Mutex<Session>,
    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
}

impl OnnxInferenceEngine {
    pub fn from_file(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            return Err(FaceAiError::ModelNotFound(model_path.to_path_buf()));
        }
        let session = session_builder()?
            .commit_from_file(model_path)
            .map_err(inference_error)?;
        info!("Loaded ONNX model {}", model_path.display());
        Ok(Self::from_session(session))
    }

    pub fn from_memory(model: &[u8]) -> Result<Self> {
        let session = session_builder()?
            .commit_from_memory(model)
            .map_err(inference_error)?;
        info!("Loaded ONNX model from {} bytes", model.len());
        Ok(Self::from_session(session))
    }

    fn from_session(session: Session) -> Self {
        let inputs = session
            .inputs()
            .iter()
            .map(|i| TensorInfo::new(i.name(), tensor_shape(i.dtype())))
            .collect();
        let outputs = session
            .outputs()
            .iter()
            .map(|o| TensorInfo::new(o.name(), tensor_shape(o.dtype())))
            .collect();
        Self {
            session: Mutex::new(session),
            inputs,
            outputs,
        }
    }
}

fn session_builder() -> Result<SessionBuilder> {
    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let builder = Session::builder()
        .map_err(inference_error)?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(inference_error)?
        .with_inter_threads(1)
        .map_err(inference_error)?
        .with_intra_threads(intra_threads)
        .map_err(inference_error)?
        .with_execution_providers(preferred_execution_providers())
        .map_err(inference_error)?;
    Ok(builder)
}

/// Shape of a tensor-typed value; empty for non-tensor values.
fn tensor_shape(value_type: &ort::value::ValueType) -> Vec<i64> {
    if let ort::value::ValueType::Tensor { ref shape, .. } = value_type {
        shape.iter().copied().collect()
    } else {
        Vec::new()
    }
}

impl InferenceEngine for OnnxInferenceEngine {
    fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorInfo] {
        &self.outputs
    }

    fn run(&self, input: Array4<f32>) -> Result<Vec<NamedTensor>> {
        let input_value = ort::value::Tensor::from_array(input).map_err(inference_error)?;
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(inference_error)?;

        let mut tensors = Vec::with_capacity(self.outputs.len());
        for (i, info) in self.outputs.iter().enumerate() {
            let array = outputs[i]
                .try_extract_array::<f32>()
                .map_err(inference_error)?;
            tensors.push(NamedTensor::new(info.name.clone(), array.to_owned()));
        }
        Ok(tensors)
    }
}
