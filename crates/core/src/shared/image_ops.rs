//! Pixel-buffer operations on `image::RgbImage`: padded resizing, clamped
//! cropping, affine warping, aligned crops and region blurring.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::shared::error::{FaceAiError, Result};
use crate::shared::geometry::{Affine2, PointF, Rect, Size};

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Filter used wherever a resize should preserve quality.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeMode {
    /// Pads without upscaling; larger images are downscaled to fit first.
    BoxPad,
    /// Scales to fit (up or down) preserving aspect ratio, then pads.
    Pad,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorPosition {
    TopLeft,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeOptions {
    pub size: Size,
    pub mode: ResizeMode,
    pub position: AnchorPosition,
    pub pad_color: Rgb<u8>,
}

impl ResizeOptions {
    pub fn box_pad_top_left(size: Size) -> Self {
        Self {
            size,
            mode: ResizeMode::BoxPad,
            position: AnchorPosition::TopLeft,
            pad_color: BLACK,
        }
    }

    pub fn pad_centered(size: Size) -> Self {
        Self {
            size,
            mode: ResizeMode::Pad,
            position: AnchorPosition::Center,
            pad_color: BLACK,
        }
    }
}

pub fn image_size(image: &RgbImage) -> Size {
    Size::new(image.width(), image.height())
}

/// Resize `image` onto a canvas of exactly `opts.size`.
pub fn resize_with(image: &RgbImage, opts: &ResizeOptions) -> RgbImage {
    let target = opts.size;
    let mut canvas = RgbImage::from_pixel(target.width, target.height, opts.pad_color);
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || target.is_empty() {
        return canvas;
    }

    let mut factor = (target.width as f64 / w as f64).min(target.height as f64 / h as f64);
    if opts.mode == ResizeMode::BoxPad {
        factor = factor.min(1.0);
    }
    let nw = ((w as f64 * factor).round() as u32).clamp(1, target.width);
    let nh = ((h as f64 * factor).round() as u32).clamp(1, target.height);

    let scaled: Cow<RgbImage> = if (nw, nh) == (w, h) {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(imageops::resize(image, nw, nh, RESIZE_FILTER))
    };

    let (ox, oy) = match opts.position {
        AnchorPosition::TopLeft => (0, 0),
        AnchorPosition::Center => ((target.width - nw) / 2, (target.height - nh) / 2),
    };
    imageops::replace(&mut canvas, scaled.as_ref(), ox as i64, oy as i64);
    canvas
}

/// Stretch to exactly `size` with the quality filter. Empty sizes give an
/// empty image.
pub fn resize_exact(image: &RgbImage, size: Size) -> RgbImage {
    if size.is_empty() || image.width() == 0 || image.height() == 0 {
        return RgbImage::new(size.width, size.height);
    }
    if image_size(image) == size {
        return image.clone();
    }
    imageops::resize(image, size.width, size.height, RESIZE_FILTER)
}

/// Return `image` untouched if it already has the required size, otherwise a
/// resized copy. Fails instead of resizing when `fail_if_resize_required`.
pub fn ensure_properly_sized<'a>(
    image: &'a RgbImage,
    opts: &ResizeOptions,
    fail_if_resize_required: bool,
) -> Result<Cow<'a, RgbImage>> {
    let actual = image_size(image);
    if actual == opts.size {
        return Ok(Cow::Borrowed(image));
    }
    if fail_if_resize_required {
        return Err(FaceAiError::ImageSizeMismatch {
            required: opts.size,
            actual,
        });
    }
    Ok(Cow::Owned(resize_with(image, opts)))
}

/// Crop to `rect` clamped to the image bounds.
pub fn safe_crop(image: &RgbImage, rect: Rect) -> RgbImage {
    let r = rect.intersect(&Rect::from_size(image_size(image)));
    if r.is_empty() {
        return RgbImage::new(0, 0);
    }
    imageops::crop_imm(image, r.x as u32, r.y as u32, r.width as u32, r.height as u32).to_image()
}

/// Warp `image` by `m` (source to destination coordinates) onto a canvas of
/// `out_size`, sampling bilinearly. Pixels mapping outside the source take
/// `fill`.
pub fn warp_affine(image: &RgbImage, m: &Affine2, out_size: Size, fill: Rgb<u8>) -> Result<RgbImage> {
    let inv = m.invert().ok_or(FaceAiError::SingularMatrix)?;
    let mut out = RgbImage::from_pixel(out_size.width, out_size.height, fill);
    if image.width() == 0 || image.height() == 0 {
        return Ok(out);
    }

    for (x, y, px) in out.enumerate_pixels_mut() {
        let src = inv.transform_point(PointF::new(x as f32, y as f32));
        if let Some(sample) = sample_bilinear(image, src, fill) {
            *px = sample;
        }
    }
    Ok(out)
}

fn sample_bilinear(image: &RgbImage, p: PointF, fill: Rgb<u8>) -> Option<Rgb<u8>> {
    let (w, h) = (image.width() as i64, image.height() as i64);
    if p.x <= -1.0 || p.y <= -1.0 || p.x >= w as f32 || p.y >= h as f32 {
        return None;
    }

    let x0 = p.x.floor() as i64;
    let y0 = p.y.floor() as i64;
    let fx = p.x - x0 as f32;
    let fy = p.y - y0 as f32;

    let fetch = |x: i64, y: i64| -> [f32; 3] {
        let Rgb(c) = if x < 0 || y < 0 || x >= w || y >= h {
            fill
        } else {
            *image.get_pixel(x as u32, y as u32)
        };
        [c[0] as f32, c[1] as f32, c[2] as f32]
    };

    let tl = fetch(x0, y0);
    let tr = fetch(x0 + 1, y0);
    let bl = fetch(x0, y0 + 1);
    let br = fetch(x0 + 1, y0 + 1);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let top = tl[c] + (tr[c] - tl[c]) * fx;
        let bottom = bl[c] + (br[c] - bl[c]) * fx;
        out[c] = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(Rgb(out))
}

/// Cut a square around `face_area`, rotated by `angle_degrees` about the
/// face center, e.g. to level the eyes.
///
/// The output edge equals the longer edge of `face_area`, or at most
/// `max_edge` if given. Areas outside the source are black.
pub fn crop_aligned(
    image: &RgbImage,
    face_area: Rect,
    angle_degrees: f32,
    max_edge: Option<u32>,
) -> Result<RgbImage> {
    let mut face_area = face_area;
    let mut center = face_area.center_f();
    let mut square = face_area.minimum_superset_square();
    let mut working = Cow::Borrowed(image);

    // Pre-crop when the whole rotation area lies inside the image.
    let rotation_area = square.rotation_invariant_crop_area();
    if Rect::from_size(image_size(image)).contains(&rotation_area) && !rotation_area.is_empty() {
        working = Cow::Owned(safe_crop(image, rotation_area));
        let (dx, dy) = (-rotation_area.x, -rotation_area.y);
        center = center.offset(dx as f32, dy as f32);
        square = square.offset(dx, dy);
        face_area = face_area.offset(dx, dy);
    }

    if let Some(max_edge) = max_edge.filter(|e| *e > 0) {
        let longest = face_area.width.max(face_area.height) as f64;
        let factor = 1.0 / (longest / max_edge as f64).max(1.0);
        if factor < 1.0 {
            let scaled = image_size(&working).scale(factor);
            working = Cow::Owned(imageops::resize(
                working.as_ref(),
                scaled.width.max(1),
                scaled.height.max(1),
                RESIZE_FILTER,
            ));
            square = square.scale(factor);
            face_area = face_area.scale(factor);
            center = face_area.center_f();
        }
    }

    let edge = square.height.max(0) as u32;
    let m = Affine2::rotation_degrees(angle_degrees, center)
        .then(&Affine2::translation(-square.x as f32, -square.y as f32));
    warp_affine(working.as_ref(), &m, Size::square(edge), BLACK)
}

/// Gaussian-blur the part of `image` covered by `rect`.
pub fn blur_region(image: &mut RgbImage, rect: Rect, sigma: f32) {
    let r = rect.intersect(&Rect::from_size(image_size(image)));
    if r.is_empty() {
        return;
    }
    let region = imageops::crop_imm(image, r.x as u32, r.y as u32, r.width as u32, r.height as u32)
        .to_image();
    let blurred = imageops::blur(&region, sigma);
    imageops::replace(image, &blurred, r.x as i64, r.y as i64);
}
