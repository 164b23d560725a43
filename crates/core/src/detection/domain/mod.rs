pub mod anchors;
pub mod detection;
pub mod face_detector;
pub mod face_landmarks;
pub mod model_parameters;
pub mod non_max_suppression;
pub mod stride_decoder;
