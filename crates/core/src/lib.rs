//! Face detection, alignment, recognition and eye-state classification on
//! ONNX Runtime.
//!
//! Each bounded context follows the same split: `domain` holds the traits,
//! value types and pure algorithms, `infrastructure` holds the ONNX-backed
//! implementations. `pipeline` composes them into ready-made tasks.

pub mod detection;
pub mod eyes;
pub mod inference;
pub mod pipeline;
pub mod recognition;
pub mod shared;
