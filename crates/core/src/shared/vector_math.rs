/// Distance and similarity measures for embedding vectors.
use crate::shared::error::{FaceAiError, Result};

pub fn euclidean_distance(x: &[f32], y: &[f32]) -> Result<f32> {
    if x.len() != y.len() {
        return Err(FaceAiError::LengthMismatch(x.len(), y.len()));
    }
    let sum: f32 = x
        .iter()
        .zip(y)
        .map(|(a, b)| {
            let d = a - b;
            d * d
        })
        .sum();
    Ok(sum.sqrt())
}

/// `1 / (1 + distance)`, so identical vectors score 1.
pub fn euclidean_similarity(x: &[f32], y: &[f32]) -> Result<f32> {
    Ok(1.0 / (1.0 + euclidean_distance(x, y)?))
}

/// Cosine of the angle between `x` and `y`; 0 if either is a zero vector.
pub fn cosine_similarity(x: &[f32], y: &[f32]) -> f32 {
    let mut sum = 0.0f64;
    let mut p = 0.0f64;
    let mut q = 0.0f64;
    for (a, b) in x.iter().zip(y) {
        let (a, b) = (*a as f64, *b as f64);
        sum += a * b;
        p += a * a;
        q += b * b;
    }
    if sum == 0.0 {
        return 0.0;
    }
    (sum / (p.sqrt() * q.sqrt())) as f32
}

pub fn cosine_distance(x: &[f32], y: &[f32]) -> f32 {
    let sim = cosine_similarity(x, y);
    if sim == 0.0 {
        1.0
    } else {
        1.0 - sim
    }
}

/// Dot product of L2-normalized vectors equals cosine similarity.
pub fn dot(x: &[f32], y: &[f32]) -> f32 {
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

pub fn to_unit_length(v: &[f32]) -> Vec<f32> {
    let mut out = v.to_vec();
    l2_normalize(&mut out);
    out
}
