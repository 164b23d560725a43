use log::info;

use crate::inference::domain::inference_engine::TensorInfo;
use crate::shared::error::{FaceAiError, Result};
use crate::shared::geometry::Size;

const THREE_STRIDES: [u32; 3] = [8, 16, 32];
const FIVE_STRIDES: [u32; 5] = [8, 16, 32, 64, 128];

/// SCRFD model layout, derived once from the declared model signature.
///
/// Outputs are grouped by kind: the first `feature_map_count` tensors hold
/// scores, the next ones box offsets, and the final ones keypoint offsets
/// when the model predicts landmarks. Within a group strides ascend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelParameters {
    pub input_name: String,
    /// `None` when the model accepts any input size.
    pub input_size: Option<Size>,
    pub feature_map_count: usize,
    pub strides: Vec<u32>,
    pub use_keypoints: bool,
    pub anchors_per_cell: usize,
}

impl ModelParameters {
    pub fn discover(inputs: &[TensorInfo], outputs: &[TensorInfo]) -> Result<Self> {
        let input = inputs.first().ok_or(FaceAiError::NoModelInput)?;
        let input_size = static_input_size(&input.shape);

        if outputs.first().is_some_and(|o| o.shape.len() == 3) {
            return Err(FaceAiError::BatchedModelUnsupported);
        }

        let (strides, use_keypoints, anchors_per_cell) = match outputs.len() {
            6 => (THREE_STRIDES.to_vec(), false, 2),
            9 => (THREE_STRIDES.to_vec(), true, 2),
            10 => (FIVE_STRIDES.to_vec(), false, 1),
            15 => (FIVE_STRIDES.to_vec(), true, 1),
            n => return Err(FaceAiError::UnsupportedOutputCount(n)),
        };

        let params = Self {
            input_name: input.name.clone(),
            input_size,
            feature_map_count: strides.len(),
            strides,
            use_keypoints,
            anchors_per_cell,
        };
        info!(
            "SCRFD model: input {} ({}), strides {:?}, keypoints {}, {} anchors per cell",
            params.input_name,
            params
                .input_size
                .map_or_else(|| "dynamic".to_string(), |s| s.to_string()),
            params.strides,
            params.use_keypoints,
            params.anchors_per_cell
        );
        Ok(params)
    }

    pub fn score_output(&self, stride_index: usize) -> usize {
        stride_index
    }

    pub fn box_output(&self, stride_index: usize) -> usize {
        stride_index + self.feature_map_count
    }

    pub fn keypoint_output(&self, stride_index: usize) -> Option<usize> {
        self.use_keypoints
            .then_some(stride_index + 2 * self.feature_map_count)
    }
}

/// `[N, C, H, W]` to a size, or `None` if height or width is dynamic.
fn static_input_size(shape: &[i64]) -> Option<Size> {
    if shape.len() < 4 {
        return None;
    }
    let (h, w) = (shape[2], shape[3]);
    (h > 0 && w > 0).then(|| Size::new(w as u32, h as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn outputs(n: usize) -> Vec<TensorInfo> {
        (0..n)
            .map(|i| TensorInfo::new(format!("out{i}"), vec![12800, 1]))
            .collect()
    }

    fn input(shape: Vec<i64>) -> Vec<TensorInfo> {
        vec![TensorInfo::new("input.1", shape)]
    }

    #[rstest]
    #[case::three_strides(6, vec![8, 16, 32], false, 2)]
    #[case::three_strides_kps(9, vec![8, 16, 32], true, 2)]
    #[case::five_strides(10, vec![8, 16, 32, 64, 128], false, 1)]
    #[case::five_strides_kps(15, vec![8, 16, 32, 64, 128], true, 1)]
    fn test_output_count_table(
        #[case] count: usize,
        #[case] strides: Vec<u32>,
        #[case] kps: bool,
        #[case] anchors: usize,
    ) {
        let p = ModelParameters::discover(&input(vec![1, 3, 640, 640]), &outputs(count)).unwrap();
        assert_eq!(p.feature_map_count, strides.len());
        assert_eq!(p.strides, strides);
        assert_eq!(p.use_keypoints, kps);
        assert_eq!(p.anchors_per_cell, anchors);
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(7)]
    #[case(12)]
    fn test_unsupported_output_count(#[case] count: usize) {
        let err = ModelParameters::discover(&input(vec![1, 3, 640, 640]), &outputs(count)).unwrap_err();
        assert!(matches!(err, FaceAiError::UnsupportedOutputCount(n) if n == count));
    }

    #[test]
    fn test_batched_outputs_rejected() {
        let outs: Vec<_> = (0..9)
            .map(|i| TensorInfo::new(format!("out{i}"), vec![1, 12800, 1]))
            .collect();
        let err = ModelParameters::discover(&input(vec![1, 3, 640, 640]), &outs).unwrap_err();
        assert!(matches!(err, FaceAiError::BatchedModelUnsupported));
    }

    #[test]
    fn test_no_input_rejected() {
        let err = ModelParameters::discover(&[], &outputs(9)).unwrap_err();
        assert!(matches!(err, FaceAiError::NoModelInput));
    }

    #[rstest]
    #[case::static_square(vec![1, 3, 640, 640], Some(Size::new(640, 640)))]
    #[case::static_wide(vec![1, 3, 480, 640], Some(Size::new(640, 480)))]
    #[case::dynamic(vec![1, 3, -1, -1], None)]
    #[case::half_dynamic(vec![-1, 3, -1, 640], None)]
    #[case::short_shape(vec![3, 640], None)]
    fn test_input_size(#[case] shape: Vec<i64>, #[case] expected: Option<Size>) {
        let p = ModelParameters::discover(&input(shape), &outputs(9)).unwrap();
        assert_eq!(p.input_size, expected);
        assert_eq!(p.input_name, "input.1");
    }

    #[test]
    fn test_output_indices_are_grouped_by_kind() {
        let p = ModelParameters::discover(&input(vec![1, 3, 640, 640]), &outputs(9)).unwrap();
        assert_eq!(p.score_output(2), 2);
        assert_eq!(p.box_output(0), 3);
        assert_eq!(p.keypoint_output(1), Some(7));

        let p = ModelParameters::discover(&input(vec![1, 3, 640, 640]), &outputs(10)).unwrap();
        assert_eq!(p.keypoint_output(1), None);
    }
}
