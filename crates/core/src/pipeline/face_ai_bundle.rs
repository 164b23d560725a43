use std::path::{Path, PathBuf};

use log::info;

use crate::detection::infrastructure::scrfd_detector::{ScrfdDetector, ScrfdDetectorOptions};
use crate::eyes::infrastructure::open_closed_eye_detector::{OpenClosedEyeDetector, OpenClosedEyeOptions};
use crate::inference::infrastructure::model_resolver;
use crate::recognition::infrastructure::arcface_embeddings_generator::{ArcFaceEmbeddingsGenerator, ArcFaceOptions};
use crate::shared::constants::{ARCFACE_MODEL_NAME, OPEN_CLOSED_EYE_MODEL_NAME, SCRFD_MODEL_NAME};
use crate::shared::error::Result;

/// Locations of the three model files, with factories for the components
/// that use them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceAiBundle {
    pub scrfd_model: PathBuf,
    pub arcface_model: PathBuf,
    pub open_closed_eye_model: PathBuf,
}

impl FaceAiBundle {
    /// All models under their default names in `model_dir`.
    pub fn new(model_dir: &Path) -> Self {
        Self {
            scrfd_model: model_dir.join(SCRFD_MODEL_NAME),
            arcface_model: model_dir.join(ARCFACE_MODEL_NAME),
            open_closed_eye_model: model_dir.join(OPEN_CLOSED_EYE_MODEL_NAME),
        }
    }

    /// Find each model in the user cache or `bundled_dir`.
    pub fn from_resolver(bundled_dir: Option<&Path>) -> Result<Self> {
        Self::resolve_in(&model_resolver::model_cache_dir()?, bundled_dir)
    }

    /// [`FaceAiBundle::from_resolver`] against an explicit cache directory.
    pub fn resolve_in(cache_dir: &Path, bundled_dir: Option<&Path>) -> Result<Self> {
        let resolve = |name: &str| model_resolver::resolve_in(cache_dir, name, None, bundled_dir, None);
        let bundle = Self {
            scrfd_model: resolve(SCRFD_MODEL_NAME)?,
            arcface_model: resolve(ARCFACE_MODEL_NAME)?,
            open_closed_eye_model: resolve(OPEN_CLOSED_EYE_MODEL_NAME)?,
        };
        info!("Using models from {}", bundle.scrfd_model.parent().unwrap_or(cache_dir).display());
        Ok(bundle)
    }

    /// SCRFD detector sharing the process-wide anchor cache.
    pub fn scrfd_detector(&self) -> Result<ScrfdDetector> {
        ScrfdDetector::from_options(ScrfdDetectorOptions::with_model_path(&self.scrfd_model))
    }

    pub fn arcface_generator(&self) -> Result<ArcFaceEmbeddingsGenerator> {
        ArcFaceEmbeddingsGenerator::from_options(ArcFaceOptions::with_model_path(&self.arcface_model))
    }

    pub fn eye_state_detector(&self) -> Result<OpenClosedEyeDetector> {
        OpenClosedEyeDetector::from_options(OpenClosedEyeOptions::with_model_path(&self.open_closed_eye_model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::infrastructure::model_resolver::ModelResolveError;
    use crate::shared::error::FaceAiError;
    use std::fs;
    use tempfile::TempDir;

    fn touch_models(dir: &Path) {
        for name in [SCRFD_MODEL_NAME, ARCFACE_MODEL_NAME, OPEN_CLOSED_EYE_MODEL_NAME] {
            fs::write(dir.join(name), b"model").unwrap();
        }
    }

    #[test]
    fn test_new_uses_default_names() {
        let b = FaceAiBundle::new(Path::new("/models"));
        assert_eq!(b.scrfd_model, Path::new("/models/scrfd_2.5g_kps.onnx"));
        assert_eq!(b.arcface_model, Path::new("/models/arcfaceresnet100-11-int8.onnx"));
        assert_eq!(b.open_closed_eye_model, Path::new("/models/open_closed_eye.onnx"));
    }

    #[test]
    fn test_resolve_prefers_cache_then_bundled() {
        let cache = TempDir::new().unwrap();
        let bundled = TempDir::new().unwrap();
        touch_models(bundled.path());
        fs::write(cache.path().join(SCRFD_MODEL_NAME), b"cached").unwrap();

        let b = FaceAiBundle::resolve_in(cache.path(), Some(bundled.path())).unwrap();
        assert_eq!(b.scrfd_model, cache.path().join(SCRFD_MODEL_NAME));
        assert_eq!(b.arcface_model, bundled.path().join(ARCFACE_MODEL_NAME));
    }

    #[test]
    fn test_resolve_fails_for_missing_model() {
        let cache = TempDir::new().unwrap();
        let err = FaceAiBundle::resolve_in(cache.path(), None).unwrap_err();
        assert!(matches!(
            err,
            FaceAiError::ModelResolve(ModelResolveError::NotFound(ref name)) if name == SCRFD_MODEL_NAME
        ));
    }

    #[test]
    fn test_factories_report_missing_files() {
        let dir = TempDir::new().unwrap();
        let b = FaceAiBundle::new(dir.path());
        assert!(matches!(b.scrfd_detector().err().unwrap(), FaceAiError::ModelNotFound(_)));
        assert!(matches!(b.arcface_generator().err().unwrap(), FaceAiError::ModelNotFound(_)));
        assert!(matches!(b.eye_state_detector().err().unwrap(), FaceAiError::ModelNotFound(_)));
    }
}
