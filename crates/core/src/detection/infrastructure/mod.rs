pub mod scrfd_detector;
