pub mod eye_boxes;
pub mod eye_state_detector;
