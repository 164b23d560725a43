pub mod alignment;
pub mod embeddings_generator;
pub mod metrics;
