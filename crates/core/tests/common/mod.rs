#![allow(dead_code)]

use faceai_core::inference::domain::inference_engine::{InferenceEngine, NamedTensor, TensorInfo};
use faceai_core::shared::error::Result;
use ndarray::{Array4, ArrayD, IxDyn};

pub const MODEL_EDGE: u32 = 640;
pub const STRIDES: [u32; 3] = [8, 16, 32];
pub const ANCHORS_PER_CELL: usize = 2;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One planted face: an anchor of one stride with its score and offsets.
#[derive(Clone, Copy, Debug)]
pub struct Peak {
    pub stride_index: usize,
    pub cell: (u32, u32),
    pub score: f32,
    /// Left, top, right, bottom distances in stride units.
    pub box_offsets: [f32; 4],
}

impl Peak {
    pub fn anchor_index(&self) -> usize {
        let cols = MODEL_EDGE / STRIDES[self.stride_index];
        let (col, row) = self.cell;
        (row * cols + col) as usize * ANCHORS_PER_CELL
    }
}

/// Keypoint offsets in stride units: eyes above the anchor, mouth below.
pub const KEYPOINT_OFFSETS: [f32; 10] = [-1.0, -0.5, 1.0, -0.5, 0.0, 0.0, -0.8, 1.0, 0.8, 1.0];

/// 640x640 SCRFD model with keypoints that reports the planted peaks on every run.
pub struct FakeScrfdEngine {
    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
    results: Vec<NamedTensor>,
}

impl FakeScrfdEngine {
    pub fn new(peaks: &[Peak]) -> Self {
        Self::with_output_count(peaks, STRIDES.len() * 3)
    }

    /// Keeps only the first `count` outputs of the 9-output layout.
    pub fn with_output_count(peaks: &[Peak], count: usize) -> Self {
        let anchors: Vec<usize> = STRIDES
            .iter()
            .map(|s| ((MODEL_EDGE / s) * (MODEL_EDGE / s)) as usize * ANCHORS_PER_CELL)
            .collect();

        let mut scores: Vec<Vec<f32>> = anchors.iter().map(|n| vec![0.0; *n]).collect();
        let mut boxes: Vec<Vec<f32>> = anchors.iter().map(|n| vec![0.0; n * 4]).collect();
        let mut kps: Vec<Vec<f32>> = anchors.iter().map(|n| vec![0.0; n * 10]).collect();
        for p in peaks {
            let i = p.anchor_index();
            scores[p.stride_index][i] = p.score;
            boxes[p.stride_index][i * 4..i * 4 + 4].copy_from_slice(&p.box_offsets);
            kps[p.stride_index][i * 10..i * 10 + 10].copy_from_slice(&KEYPOINT_OFFSETS);
        }

        let tensor = |name: String, values: Vec<f32>, width: usize| {
            let rows = values.len() / width;
            NamedTensor::new(name, ArrayD::from_shape_vec(IxDyn(&[rows, width]), values).unwrap())
        };
        let mut results = Vec::new();
        for (s, v) in STRIDES.iter().zip(scores) {
            results.push(tensor(format!("score_{s}"), v, 1));
        }
        for (s, v) in STRIDES.iter().zip(boxes) {
            results.push(tensor(format!("bbox_{s}"), v, 4));
        }
        for (s, v) in STRIDES.iter().zip(kps) {
            results.push(tensor(format!("kps_{s}"), v, 10));
        }
        results.truncate(count);

        let edge = MODEL_EDGE as i64;
        Self {
            inputs: vec![TensorInfo::new("input.1", vec![1, 3, edge, edge])],
            outputs: results
                .iter()
                .map(|t| TensorInfo::new(t.name.clone(), t.data.shape().iter().map(|d| *d as i64).collect()))
                .collect(),
            results,
        }
    }
}

impl InferenceEngine for FakeScrfdEngine {
    fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorInfo] {
        &self.outputs
    }

    fn run(&self, input: Array4<f32>) -> Result<Vec<NamedTensor>> {
        let edge = MODEL_EDGE as usize;
        assert_eq!(input.shape(), &[1, 3, edge, edge]);
        Ok(self.results.clone())
    }
}

/// Fixed two-value classifier output, `[closed, open]`.
pub struct FixedEyeEngine {
    inputs: Vec<TensorInfo>,
    open: bool,
}

impl FixedEyeEngine {
    pub fn new(open: bool) -> Self {
        Self {
            inputs: vec![TensorInfo::new("input", vec![1, 3, 32, 32])],
            open,
        }
    }
}

impl InferenceEngine for FixedEyeEngine {
    fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorInfo] {
        &[]
    }

    fn run(&self, input: Array4<f32>) -> Result<Vec<NamedTensor>> {
        assert_eq!(input.shape(), &[1, 3, 32, 32]);
        let values = if self.open { vec![0.2, 0.8] } else { vec![0.8, 0.2] };
        Ok(vec![NamedTensor::new("prob", ArrayD::from_shape_vec(IxDyn(&[1, 2]), values).unwrap())])
    }
}

/// Embeds the per-channel means of the 112x112 input plus a constant.
pub struct ChannelMeanEngine {
    inputs: Vec<TensorInfo>,
}

impl ChannelMeanEngine {
    pub fn new() -> Self {
        Self {
            inputs: vec![TensorInfo::new("data", vec![1, 3, 112, 112])],
        }
    }
}

impl InferenceEngine for ChannelMeanEngine {
    fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorInfo] {
        &[]
    }

    fn run(&self, input: Array4<f32>) -> Result<Vec<NamedTensor>> {
        assert_eq!(input.shape(), &[1, 3, 112, 112]);
        let mut values: Vec<f32> = (0..3)
            .map(|c| input.index_axis(ndarray::Axis(1), c).mean().unwrap_or(0.0))
            .collect();
        values.push(1.0);
        Ok(vec![NamedTensor::new("fc1", ArrayD::from_shape_vec(IxDyn(&[1, 4]), values).unwrap())])
    }
}
