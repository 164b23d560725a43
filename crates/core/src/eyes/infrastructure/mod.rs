pub mod open_closed_eye_detector;
