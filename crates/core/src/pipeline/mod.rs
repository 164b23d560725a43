pub mod applications;
pub mod embedding_batch;
pub mod face_ai_bundle;
