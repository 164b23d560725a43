pub mod constants;
pub mod error;
pub mod geometry;
pub mod image_ops;
pub mod tensor;
pub mod vector_math;
