//! Held-out evaluation metrics for binary probability forecasts.
//!
//! All functions take the true 0/1 labels and predicted positive-class
//! probabilities of the same length.
use std::cmp::Ordering;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Probabilities are clipped to `[EPS, 1 - EPS]` before taking logarithms.
pub const LOG_LOSS_EPS: f64 = 1e-15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    pub fn accuracy(&self) -> f64 {
        (self.true_positives + self.true_negatives) as f64 / self.total().max(1) as f64
    }

    /// `None` when nothing was predicted positive.
    pub fn precision(&self) -> Option<f64> {
        let predicted = self.true_positives + self.false_positives;
        (predicted > 0).then(|| self.true_positives as f64 / predicted as f64)
    }

    /// `None` when there are no positive labels.
    pub fn recall(&self) -> Option<f64> {
        let actual = self.true_positives + self.false_negatives;
        (actual > 0).then(|| self.true_positives as f64 / actual as f64)
    }

    pub fn f1(&self) -> Option<f64> {
        let p = self.precision()?;
        let r = self.recall()?;
        if p + r == 0.0 {
            Some(0.0)
        } else {
            Some(2.0 * p * r / (p + r))
        }
    }
}

fn check_inputs(y_true: &Array1<f64>, probabilities: &Array1<f64>) -> Result<()> {
    if y_true.len() != probabilities.len() {
        return Err(ValidationError::LengthMismatch {
            predictors: probabilities.len(),
            targets: y_true.len(),
        });
    }
    if y_true.is_empty() {
        return Err(ValidationError::invalid_argument(
            "cannot evaluate an empty prediction set",
        ));
    }
    Ok(())
}

pub fn confusion_matrix(y_true: &Array1<f64>, probabilities: &Array1<f64>, threshold: f64) -> ConfusionMatrix {
    let mut cm = ConfusionMatrix::default();
    for (&t, &p) in y_true.iter().zip(probabilities.iter()) {
        match (t == 1.0, p >= threshold) {
            (true, true) => cm.true_positives += 1,
            (false, true) => cm.false_positives += 1,
            (false, false) => cm.true_negatives += 1,
            (true, false) => cm.false_negatives += 1,
        }
    }
    cm
}

pub fn accuracy(y_true: &Array1<f64>, probabilities: &Array1<f64>, threshold: f64) -> f64 {
    confusion_matrix(y_true, probabilities, threshold).accuracy()
}

/// Mean negative log-likelihood of the labels.
pub fn log_loss(y_true: &Array1<f64>, probabilities: &Array1<f64>) -> f64 {
    let n = y_true.len().max(1) as f64;
    let total: f64 = y_true
        .iter()
        .zip(probabilities.iter())
        .map(|(&t, &p)| {
            let p = p.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
            -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        })
        .sum();
    total / n
}

/// Mean squared difference between probability and label.
pub fn brier_score(y_true: &Array1<f64>, probabilities: &Array1<f64>) -> f64 {
    let n = y_true.len().max(1) as f64;
    (y_true - probabilities).mapv(|d| d * d).sum() / n
}

/// Area under the ROC curve from the Mann-Whitney rank statistic.
///
/// Tied scores share their average rank. Returns `None` if only one class
/// is present.
pub fn roc_auc(y_true: &Array1<f64>, scores: &Array1<f64>) -> Option<f64> {
    let n_pos = y_true.iter().filter(|&&t| t == 1.0).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0f64; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // 1-based ranks start+1 ..= end share their mean
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg_rank;
        }
        start = end;
    }

    let rank_sum_pos: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&t, _)| t == 1.0)
        .map(|(_, &r)| r)
        .sum();
    let n_pos_f = n_pos as f64;
    Some((rank_sum_pos - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg as f64))
}

/// Metrics of one prediction set (a test fold, or all out-of-fold rows pooled).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldMetrics {
    pub n_rows: usize,
    pub accuracy: f64,
    pub log_loss: f64,
    pub brier_score: f64,
    pub roc_auc: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    pub confusion: ConfusionMatrix,
}

impl FoldMetrics {
    pub fn compute(y_true: &Array1<f64>, probabilities: &Array1<f64>, threshold: f64) -> Result<Self> {
        check_inputs(y_true, probabilities)?;
        let confusion = confusion_matrix(y_true, probabilities, threshold);
        Ok(FoldMetrics {
            n_rows: y_true.len(),
            accuracy: confusion.accuracy(),
            log_loss: log_loss(y_true, probabilities),
            brier_score: brier_score(y_true, probabilities),
            roc_auc: roc_auc(y_true, probabilities),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            confusion,
        })
    }
}

/// Mean and population standard deviation; `(NaN, NaN)` for no values.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Summary across the folds that succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub n_folds: usize,
    pub mean_accuracy: f64,
    pub std_accuracy: f64,
    pub mean_log_loss: f64,
    pub std_log_loss: f64,
    /// Mean over folds whose test rows held both classes
    pub mean_roc_auc: Option<f64>,
    /// Metrics of all out-of-fold predictions taken together
    pub pooled: FoldMetrics,
}

impl AggregateMetrics {
    /// `per_fold` are the metrics of each successful fold; `y_true` and
    /// `probabilities` are the concatenated out-of-fold rows.
    pub fn compute(
        per_fold: &[&FoldMetrics],
        y_true: &Array1<f64>,
        probabilities: &Array1<f64>,
        threshold: f64,
    ) -> Result<Self> {
        if per_fold.is_empty() {
            return Err(ValidationError::invalid_argument(
                "no successful folds to aggregate",
            ));
        }
        let accuracies: Vec<f64> = per_fold.iter().map(|m| m.accuracy).collect();
        let losses: Vec<f64> = per_fold.iter().map(|m| m.log_loss).collect();
        let aucs: Vec<f64> = per_fold.iter().filter_map(|m| m.roc_auc).collect();

        let (mean_accuracy, std_accuracy) = mean_std(&accuracies);
        let (mean_log_loss, std_log_loss) = mean_std(&losses);

        Ok(AggregateMetrics {
            n_folds: per_fold.len(),
            mean_accuracy,
            std_accuracy,
            mean_log_loss,
            std_log_loss,
            mean_roc_auc: (!aucs.is_empty()).then(|| mean_std(&aucs).0),
            pooled: FoldMetrics::compute(y_true, probabilities, threshold)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confusion_matrix_counts() {
        let y = array![1.0, 1.0, 0.0, 0.0, 1.0];
        let p = array![0.9, 0.4, 0.6, 0.1, 0.5];
        let cm = confusion_matrix(&y, &p, 0.5);
        assert_eq!(cm.true_positives, 2);
        assert_eq!(cm.false_negatives, 1);
        assert_eq!(cm.false_positives, 1);
        assert_eq!(cm.true_negatives, 1);
        assert!((cm.accuracy() - 0.6).abs() < 1e-12);
        assert!((cm.precision().unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.recall().unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_log_loss_clips_extremes() {
        let y = array![1.0, 0.0];
        let p = array![0.0, 1.0];
        let loss = log_loss(&y, &p);
        assert!(loss.is_finite());
        assert!((loss - (-(LOG_LOSS_EPS).ln())).abs() < 1e-6);

        let half = log_loss(&y, &array![0.5, 0.5]);
        assert!((half - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_brier_score() {
        let y = array![1.0, 0.0];
        let p = array![0.8, 0.4];
        assert!((brier_score(&y, &p) - (0.04 + 0.16) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_perfect_and_ties() {
        let y = array![0.0, 0.0, 1.0, 1.0];
        assert_eq!(roc_auc(&y, &array![0.1, 0.2, 0.8, 0.9]), Some(1.0));
        assert_eq!(roc_auc(&y, &array![0.9, 0.8, 0.2, 0.1]), Some(0.0));
        assert_eq!(roc_auc(&y, &array![0.5, 0.5, 0.5, 0.5]), Some(0.5));
        // One positive/negative pair tied, three ordered correctly
        let auc = roc_auc(&y, &array![0.1, 0.6, 0.6, 0.9]).unwrap();
        assert!((auc - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_single_class() {
        assert_eq!(roc_auc(&array![1.0, 1.0], &array![0.3, 0.7]), None);
    }

    #[test]
    fn test_fold_metrics_rejects_mismatch() {
        assert!(FoldMetrics::compute(&array![1.0], &array![0.5, 0.5], 0.5).is_err());
        assert!(FoldMetrics::compute(&array![], &array![], 0.5).is_err());
    }

    #[test]
    fn test_mean_std() {
        let (m, s) = mean_std(&[1.0, 3.0]);
        assert_eq!(m, 2.0);
        assert_eq!(s, 1.0);
        assert!(mean_std(&[]).0.is_nan());
    }
}
