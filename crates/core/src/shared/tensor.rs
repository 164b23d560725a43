//! Conversion of RGB images into normalized NCHW float tensors.
//!
//! Each channel value is mapped as `(v / 255 - mean) / stddev`, computed as
//! `v * scale - offset` with both terms precomputed per channel.

use image::RgbImage;
use ndarray::Array4;

use crate::shared::error::{FaceAiError, Result};
use crate::shared::geometry::Size;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalization {
    pub mean: [f32; 3],
    pub stddev: [f32; 3],
}

impl Normalization {
    /// Maps 0..255 onto -0.5..0.5.
    pub const SCRFD: Normalization = Normalization {
        mean: [0.5; 3],
        stddev: [1.0; 3],
    };

    /// Keeps raw 0..255 values.
    pub const ARCFACE: Normalization = Normalization {
        mean: [0.0; 3],
        stddev: [1.0 / 255.0; 3],
    };

    pub const OPEN_CLOSED_EYE: Normalization = Normalization {
        mean: [0.5; 3],
        stddev: [1.0; 3],
    };

    fn channel_terms(&self) -> ([f32; 3], [f32; 3]) {
        let mut scale = [0.0; 3];
        let mut offset = [0.0; 3];
        for c in 0..3 {
            scale[c] = 1.0 / (255.0 * self.stddev[c]);
            offset[c] = self.mean[c] / self.stddev[c];
        }
        (scale, offset)
    }
}

/// Write `image` into a pre-allocated CHW buffer of exactly `3 * w * h` floats.
///
/// With `swap_rb` the first tensor channel holds blue (BGR order).
pub fn write_image_to_tensor(
    image: &RgbImage,
    norm: &Normalization,
    swap_rb: bool,
    buffer: &mut [f32],
) -> Result<()> {
    let plane = image.width() as usize * image.height() as usize;
    if buffer.len() != plane * 3 {
        return Err(FaceAiError::TensorLength {
            name: "image".to_string(),
            expected: plane * 3,
            actual: buffer.len(),
        });
    }

    let (scale, offset) = norm.channel_terms();
    let (c0, c2) = if swap_rb { (2, 0) } else { (0, 2) };
    let (r_plane, rest) = buffer.split_at_mut(plane);
    let (g_plane, b_plane) = rest.split_at_mut(plane);

    for (i, px) in image.pixels().enumerate() {
        r_plane[i] = px[c0] as f32 * scale[0] - offset[0];
        g_plane[i] = px[1] as f32 * scale[1] - offset[1];
        b_plane[i] = px[c2] as f32 * scale[2] - offset[2];
    }
    Ok(())
}

/// Single image as a `[1, 3, H, W]` tensor.
pub fn image_to_tensor(image: &RgbImage, norm: &Normalization, swap_rb: bool) -> Result<Array4<f32>> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let mut data = vec![0.0f32; 3 * w * h];
    write_image_to_tensor(image, norm, swap_rb, &mut data)?;
    Ok(Array4::from_shape_vec((1, 3, h, w), data)?)
}

/// Batch of equally sized images as a `[N, 3, H, W]` tensor.
pub fn images_to_tensor(
    images: &[RgbImage],
    norm: &Normalization,
    swap_rb: bool,
) -> Result<Array4<f32>> {
    let Some(first) = images.first() else {
        return Ok(Array4::zeros((0, 3, 0, 0)));
    };
    let size = Size::new(first.width(), first.height());
    let per_image = 3 * size.width as usize * size.height as usize;
    let mut data = vec![0.0f32; per_image * images.len()];

    for (image, chunk) in images.iter().zip(data.chunks_exact_mut(per_image.max(1))) {
        let actual = Size::new(image.width(), image.height());
        if actual != size {
            return Err(FaceAiError::ImageSizeMismatch {
                required: size,
                actual,
            });
        }
        write_image_to_tensor(image, norm, swap_rb, chunk)?;
    }

    Ok(Array4::from_shape_vec(
        (images.len(), 3, size.height as usize, size.width as usize),
        data,
    )?)
}
