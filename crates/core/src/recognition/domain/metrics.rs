//! Quality measures for a binary face-matching classifier.
//!
//! Every function expects estimations sorted by descending confidence.

/// One classifier output with its ground truth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimation {
    pub confidence: f32,
    pub is_match: bool,
}

impl Estimation {
    pub fn new(confidence: f32, is_match: bool) -> Self {
        Self {
            confidence,
            is_match,
        }
    }
}

impl From<(f32, bool)> for Estimation {
    fn from((confidence, is_match): (f32, bool)) -> Self {
        Self::new(confidence, is_match)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RocPoint {
    pub false_positive_rate: f32,
    pub true_positive_rate: f32,
    pub threshold: f32,
}

fn class_counts(estimations: &[Estimation]) -> (f64, f64) {
    let p = estimations.iter().filter(|e| e.is_match).count() as f64;
    (p, estimations.len() as f64 - p)
}

/// `num / den`, or 0 for an empty class.
fn rate(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Area under the ROC curve. Higher is better; 0.5 is chance level.
///
/// Each run of matches contributes its height weighted by the share of
/// negatives still ahead of the first non-match that ends it.
pub fn auc(estimations: &[Estimation]) -> f32 {
    let (p, n) = class_counts(estimations);
    let mut area = 0.0f64;
    let mut height = 0.0f64;
    let mut positives = 0usize;

    for (i, e) in estimations.iter().enumerate() {
        let seen = i + 1;
        if e.is_match {
            positives += 1;
            height += rate(1.0, p);
        } else {
            let fpr = rate((seen - positives) as f64, n);
            area += height * (1.0 - fpr);
            height = 0.0;
        }
    }
    area as f32
}

/// ROC curve, one point per estimation, using its confidence as threshold.
pub fn roc_points(estimations: &[Estimation]) -> Vec<RocPoint> {
    let (p, n) = class_counts(estimations);
    let mut positives = 0usize;
    estimations
        .iter()
        .enumerate()
        .map(|(i, e)| {
            if e.is_match {
                positives += 1;
            }
            RocPoint {
                false_positive_rate: rate((i + 1 - positives) as f64, n) as f32,
                true_positive_rate: rate(positives as f64, p) as f32,
                threshold: e.confidence,
            }
        })
        .collect()
}

/// Confidence at which the classifier reaches its best accuracy. The first
/// maximum wins; 0 for empty input.
pub fn find_threshold(estimations: &[Estimation]) -> f32 {
    let (p, n) = class_counts(estimations);
    let mut best_accuracy = 0.0f64;
    let mut pivot = 0.0f32;
    let mut true_positives = 0usize;

    for (i, e) in estimations.iter().enumerate() {
        if e.is_match {
            true_positives += 1;
        }
        let false_positives = (i + 1 - true_positives) as f64;
        let true_negatives = n - false_positives;
        let accuracy = rate(true_positives as f64 + true_negatives, p + n);
        if accuracy > best_accuracy {
            best_accuracy = accuracy;
            pivot = e.confidence;
        }
    }
    pivot
}
