use ndarray::{Array4, ArrayD};

use crate::shared::error::Result;

/// Declared name and shape of a model input or output. Dynamic dimensions
/// are reported as `-1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorInfo {
    pub name: String,
    pub shape: Vec<i64>,
}

impl TensorInfo {
    pub fn new(name: impl Into<String>, shape: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NamedTensor {
    pub name: String,
    pub data: ArrayD<f32>,
}

impl NamedTensor {
    pub fn new(name: impl Into<String>, data: ArrayD<f32>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Domain interface for running a neural network on one NCHW float tensor.
///
/// Outputs are returned in the model's declared output order. Implementations
/// must be shareable across threads; a detector holding one can be used from
/// several workers at once.
pub trait InferenceEngine: Send + Sync {
    fn inputs(&self) -> &[TensorInfo];
    fn outputs(&self) -> &[TensorInfo];
    fn run(&self, input: Array4<f32>) -> Result<Vec<NamedTensor>>;
}
