//! Face alignment onto the canonical ArcFace landmark template.
//!
//! A transform mapping the detected landmarks onto
//! [`ARCFACE_CANONICAL_LANDMARKS`] is estimated by least squares and then
//! applied in two stages: a quality resize for the scale component and an
//! affine warp for what remains. Only the source region that can reach the
//! output is touched.

use image::RgbImage;

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::constants::{ARCFACE_CANONICAL_LANDMARKS, ARCFACE_INPUT_EDGE};
use crate::shared::error::{FaceAiError, Result};
use crate::shared::geometry::{Affine2, PointF, Rect, Size};
use crate::shared::image_ops::{resize_exact, safe_crop, warp_affine, BLACK};

/// Relative pivot size below which a system is treated as singular.
const PIVOT_EPSILON: f64 = 1e-10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransformModel {
    /// Full 6-DOF affine fit; allows shear and anisotropic scale.
    #[default]
    Affine,
    /// Rotation, uniform scale and translation only.
    Similarity,
}

/// Least-squares affine transform taking `src` onto `dst`.
pub fn estimate_affinity_matrix(src: &[PointF], dst: &[PointF]) -> Result<Affine2> {
    check_lengths(src, dst)?;
    let mut ata = [[0.0f64; 6]; 6];
    let mut atb = [0.0f64; 6];
    for (s, d) in src.iter().zip(dst) {
        let (sx, sy) = (s.x as f64, s.y as f64);
        accumulate(&mut ata, &mut atb, &[sx, sy, 1.0, 0.0, 0.0, 0.0], d.x as f64);
        accumulate(&mut ata, &mut atb, &[0.0, 0.0, 0.0, sx, sy, 1.0], d.y as f64);
    }
    let p = solve(ata, atb).ok_or(FaceAiError::DegenerateLandmarks)?;
    Ok(Affine2::new(
        p[0] as f32,
        p[1] as f32,
        p[2] as f32,
        p[3] as f32,
        p[4] as f32,
        p[5] as f32,
    ))
}

/// Least-squares similarity transform `[s·cos −s·sin tx; s·sin s·cos ty]`
/// taking `src` onto `dst`.
pub fn estimate_similarity_matrix(src: &[PointF], dst: &[PointF]) -> Result<Affine2> {
    check_lengths(src, dst)?;
    let mut ata = [[0.0f64; 4]; 4];
    let mut atb = [0.0f64; 4];
    for (s, d) in src.iter().zip(dst) {
        let (sx, sy) = (s.x as f64, s.y as f64);
        accumulate(&mut ata, &mut atb, &[sx, -sy, 1.0, 0.0], d.x as f64);
        accumulate(&mut ata, &mut atb, &[sy, sx, 0.0, 1.0], d.y as f64);
    }
    let [a, b, tx, ty] = solve(ata, atb).ok_or(FaceAiError::DegenerateLandmarks)?;
    Ok(Affine2::new(
        a as f32,
        -b as f32,
        tx as f32,
        b as f32,
        a as f32,
        ty as f32,
    ))
}

/// Transform from `landmarks` onto the 112x112 canonical template.
pub fn estimate_alignment(landmarks: &FaceLandmarks, model: TransformModel) -> Result<Affine2> {
    let src = landmarks.points();
    match model {
        TransformModel::Affine => estimate_affinity_matrix(src, &ARCFACE_CANONICAL_LANDMARKS),
        TransformModel::Similarity => estimate_similarity_matrix(src, &ARCFACE_CANONICAL_LANDMARKS),
    }
}

/// Cut the face described by `landmarks` out of `image` as an
/// `edge_size x edge_size` crop in canonical pose. Parts outside the source
/// are black.
pub fn align_using_facial_landmarks(
    image: &RgbImage,
    landmarks: &FaceLandmarks,
    edge_size: u32,
    model: TransformModel,
) -> Result<RgbImage> {
    let k = edge_size as f32 / ARCFACE_INPUT_EDGE as f32;
    let m = estimate_alignment(landmarks, model)?.then(&Affine2::scale(k, k));
    let inverse = m.invert().ok_or(FaceAiError::SingularMatrix)?;

    let edge = edge_size as i32;
    let area = Rect::new(0, 0, edge, edge).superset_area_of_transform(&inverse);
    let cropped = safe_crop(image, area);

    let h = m.h_scale_factor();
    let v = m.v_scale_factor();
    if h <= 0.0 || v <= 0.0 {
        return Err(FaceAiError::SingularMatrix);
    }
    let scaled_size = Size::new(
        (cropped.width() as f32 * h).round() as u32,
        (cropped.height() as f32 * v).round() as u32,
    );
    let scaled = resize_exact(&cropped, scaled_size);

    // Scaled crop pixels back to source pixels, then through the rest of `m`.
    let residual = Affine2::scale(1.0 / h, 1.0 / v).then(&m);
    let origin = PointF::new(area.x.max(0) as f32 * h, area.y.max(0) as f32 * v);
    let warp = Affine2::translation(origin.x, origin.y).then(&residual);
    warp_affine(&scaled, &warp, Size::square(edge_size), BLACK)
}

fn check_lengths(src: &[PointF], dst: &[PointF]) -> Result<()> {
    if src.len() != dst.len() {
        return Err(FaceAiError::LengthMismatch(src.len(), dst.len()));
    }
    Ok(())
}

/// Add one equation `row · p = rhs` to the normal equations.
fn accumulate<const N: usize>(ata: &mut [[f64; N]; N], atb: &mut [f64; N], row: &[f64; N], rhs: f64) {
    for j in 0..N {
        for k in 0..N {
            ata[j][k] += row[j] * row[k];
        }
        atb[j] += row[j] * rhs;
    }
}

/// Gaussian elimination with partial pivoting. `None` for singular systems.
#[allow(clippy::needless_range_loop)]
fn solve<const N: usize>(mut a: [[f64; N]; N], mut b: [f64; N]) -> Option<[f64; N]> {
    let scale = a
        .iter()
        .flat_map(|r| r.iter())
        .fold(0.0f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return None;
    }

    for col in 0..N {
        let pivot_row = (col..N).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        let pivot = a[col][col];
        if pivot.abs() < PIVOT_EPSILON * scale {
            return None;
        }
        for row in (col + 1)..N {
            let factor = a[row][col] / pivot;
            for j in col..N {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; N];
    for i in (0..N).rev() {
        let tail: f64 = ((i + 1)..N).map(|j| a[i][j] * x[j]).sum();
        x[i] = (b[i] - tail) / a[i][i];
    }
    Some(x)
}
