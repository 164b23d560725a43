use image::RgbImage;

use crate::shared::error::Result;

/// Domain interface for classifying a cropped eye image.
pub trait EyeStateDetector: Send + Sync {
    fn is_open(&self, eye_image: &RgbImage) -> Result<bool>;
}
