//! Embedding generation for whole image collections.
//!
//! Layout: `producers [load → detect → align] → bounded queue → caller [embed]`
//!
//! One detector is shared by all producer threads. Embedding runs on the
//! calling thread so the generator needs no sharing. A failing item is
//! logged and reported in its outcome; the rest of the batch continues.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use log::{info, warn};

use crate::detection::domain::detection::most_confident;
use crate::detection::domain::face_detector::FaceDetector;
use crate::recognition::domain::embeddings_generator::FaceEmbeddingsGenerator;
use crate::shared::constants::{ARCFACE_INPUT_EDGE, DEFAULT_BATCH_QUEUE_CAPACITY, IMAGE_EXTENSIONS};
use crate::shared::error::{FaceAiError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchItem {
    pub id: String,
    pub path: PathBuf,
}

impl BatchItem {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    /// Item named after the file stem.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { id, path }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingOutcome {
    pub id: String,
    pub embedding: std::result::Result<Vec<f32>, String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchOptions {
    pub producer_threads: usize,
    pub queue_capacity: usize,
    pub edge_size: u32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            producer_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            queue_capacity: DEFAULT_BATCH_QUEUE_CAPACITY,
            edge_size: ARCFACE_INPUT_EDGE,
        }
    }
}

/// Image files directly inside `dir`, sorted by path.
pub fn image_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if path.is_file() && is_image {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Embed the most confident face of every item, in input order.
pub fn generate_embeddings_batch<D, G>(
    items: &[BatchItem],
    detector: &D,
    generator: &G,
    options: &BatchOptions,
) -> Vec<EmbeddingOutcome>
where
    D: FaceDetector + ?Sized,
    G: FaceEmbeddingsGenerator + ?Sized,
{
    let workers = options.producer_threads.clamp(1, items.len().max(1));
    let (tx, rx) = crossbeam_channel::bounded::<(usize, Result<RgbImage>)>(options.queue_capacity.max(1));

    let mut outcomes: Vec<(usize, EmbeddingOutcome)> = std::thread::scope(|s| {
        for worker in 0..workers {
            let tx = tx.clone();
            s.spawn(move || {
                for index in (worker..items.len()).step_by(workers) {
                    let aligned = load_and_align(&items[index], detector, generator, options.edge_size);
                    if tx.send((index, aligned)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        rx.iter()
            .map(|(index, aligned)| {
                let item = &items[index];
                let embedding = aligned
                    .and_then(|face| generator.generate(&face))
                    .map_err(|e| {
                        warn!("Skipping {} ({}): {e}", item.id, item.path.display());
                        e.to_string()
                    });
                (
                    index,
                    EmbeddingOutcome {
                        id: item.id.clone(),
                        embedding,
                    },
                )
            })
            .collect()
    });

    outcomes.sort_by_key(|(index, _)| *index);
    let succeeded = outcomes.iter().filter(|(_, o)| o.embedding.is_ok()).count();
    info!("Generated {succeeded} of {} embeddings", outcomes.len());
    outcomes.into_iter().map(|(_, o)| o).collect()
}

fn load_and_align<D, G>(item: &BatchItem, detector: &D, generator: &G, edge_size: u32) -> Result<RgbImage>
where
    D: FaceDetector + ?Sized,
    G: FaceEmbeddingsGenerator + ?Sized,
{
    let image = image::open(&item.path)?.to_rgb8();
    let faces = detector.detect_faces(&image)?;
    let face = most_confident(&faces).ok_or(FaceAiError::NoFaceFound)?;
    let landmarks = face.landmarks.as_ref().ok_or(FaceAiError::MissingLandmarks)?;
    generator.align_face(&image, landmarks, edge_size)
}
