use itertools_num::linspace;
use ndarray::Array1;
use plotly::common::{DashType, Line, Mode};
use plotly::layout::{Axis, BarMode, Layout};
use plotly::{Bar, Histogram, Plot, Scatter};

use crate::validator::CrossValidationReport;

fn split_by_class(probabilities: &Array1<f64>, labels: &Array1<f64>) -> Result<(Vec<f64>, Vec<f64>), String> {
    if probabilities.len() != labels.len() {
        return Err(format!(
            "{} probabilities for {} labels",
            probabilities.len(),
            labels.len()
        ));
    }
    let mut positives = Vec::new();
    let mut negatives = Vec::new();
    for (&p, &label) in probabilities.iter().zip(labels.iter()) {
        if !p.is_finite() {
            continue;
        }
        if label == 1.0 {
            positives.push(p);
        } else {
            negatives.push(p);
        }
    }
    Ok((positives, negatives))
}

/// Histogram of out-of-fold probabilities for each class. Rows without a
/// prediction (NaN) are skipped.
pub fn plot_probability_histogram(
    probabilities: &Array1<f64>,
    labels: &Array1<f64>,
    title: &str,
) -> Result<Plot, String> {
    let (positives, negatives) = split_by_class(probabilities, labels)?;

    let layout = Layout::new()
        .title(title)
        .bar_mode(BarMode::Overlay)
        .x_axis(Axis::new().title("Predicted probability"))
        .y_axis(Axis::new().title("Count"));

    let mut plot = Plot::new();
    plot.add_trace(Histogram::new(positives).name("Positive (y = 1)").opacity(0.6));
    plot.add_trace(Histogram::new(negatives).name("Negative (y = 0)").opacity(0.6));
    plot.set_layout(layout);

    Ok(plot)
}

/// False and true positive rates at `n_thresholds` evenly spaced cut-offs
/// from 1 down to 0.
pub fn roc_points(
    probabilities: &Array1<f64>,
    labels: &Array1<f64>,
    n_thresholds: usize,
) -> Result<(Vec<f64>, Vec<f64>), String> {
    let (positives, negatives) = split_by_class(probabilities, labels)?;
    if positives.is_empty() || negatives.is_empty() {
        return Err("ROC curve needs both classes".to_string());
    }

    let rate = |scores: &[f64], cutoff: f64| {
        scores.iter().filter(|&&p| p >= cutoff).count() as f64 / scores.len() as f64
    };

    Ok(linspace(1.0, 0.0, n_thresholds.max(2))
        .map(|cutoff| (rate(&negatives, cutoff), rate(&positives, cutoff)))
        .unzip())
}

pub fn plot_roc_curve(
    probabilities: &Array1<f64>,
    labels: &Array1<f64>,
    auc: Option<f64>,
    title: &str,
) -> Result<Plot, String> {
    let (fpr, tpr) = roc_points(probabilities, labels, 201)?;

    let name = match auc {
        Some(auc) => format!("Out-of-fold (AUC = {:.3})", auc),
        None => "Out-of-fold".to_string(),
    };

    let mut plot = Plot::new();
    plot.add_trace(Scatter::new(fpr, tpr).mode(Mode::Lines).name(&name));
    plot.add_trace(
        Scatter::new(vec![0.0, 1.0], vec![0.0, 1.0])
            .mode(Mode::Lines)
            .name("Chance")
            .line(Line::new().color("grey").dash(DashType::Dash)),
    );
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("False positive rate"))
            .y_axis(Axis::new().title("True positive rate")),
    );

    Ok(plot)
}

/// Grouped bars of accuracy and log-loss for every successful fold.
pub fn plot_fold_metrics(report: &CrossValidationReport, title: &str) -> Plot {
    let labels: Vec<String> = report
        .folds
        .iter()
        .map(|r| format!("Fold {}", r.fold))
        .collect();
    let accuracy: Vec<f64> = report.folds.iter().map(|r| r.metrics.accuracy).collect();
    let log_loss: Vec<f64> = report.folds.iter().map(|r| r.metrics.log_loss).collect();

    let mut plot = Plot::new();
    plot.add_trace(Bar::new(labels.clone(), accuracy).name("Accuracy"));
    plot.add_trace(Bar::new(labels, log_loss).name("Log-loss"));
    plot.set_layout(
        Layout::new()
            .title(title)
            .bar_mode(BarMode::Group)
            .x_axis(Axis::new().title("Fold"))
            .y_axis(Axis::new().title("Value")),
    );
    plot
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_roc_points_endpoints() {
        let p = array![0.1, 0.4, 0.35, 0.8];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let (fpr, tpr) = roc_points(&p, &y, 11).unwrap();
        assert_eq!(fpr.len(), 11);
        assert_eq!((fpr[0], tpr[0]), (0.0, 0.0));
        assert_eq!((fpr[10], tpr[10]), (1.0, 1.0));
        assert!(fpr.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_roc_points_single_class() {
        assert!(roc_points(&array![0.2, 0.9], &array![1.0, 1.0], 5).is_err());
    }

    #[test]
    fn test_histogram_skips_missing_predictions() {
        let p = array![0.2, f64::NAN, 0.9];
        let y = array![0.0, 1.0, 1.0];
        let (pos, neg) = split_by_class(&p, &y).unwrap();
        assert_eq!(pos, vec![0.9]);
        assert_eq!(neg, vec![0.2]);
        assert!(plot_probability_histogram(&p, &y, "p").is_ok());
        assert!(plot_probability_histogram(&p, &array![1.0], "p").is_err());
    }
}
