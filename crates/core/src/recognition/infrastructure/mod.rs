pub mod arcface_embeddings_generator;
