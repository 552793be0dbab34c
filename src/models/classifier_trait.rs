use ndarray::{Array1, Array2};

use crate::error::Result;

/// Contract between the fold validator and the model it fits on each fold.
///
/// Targets use the 0/1 convention. A fresh instance is built for every fold,
/// so implementations never need to reset state between folds.
pub trait BinaryClassifier {
    /// Fit on a training partition. Must fail rather than return a degenerate model.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, feature_names: &[String]) -> Result<()>;

    /// Probability of the positive class for each row.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Hard 0/1 labels using `threshold` on the positive-class probability.
    fn predict(&self, x: &Array2<f64>, threshold: f64) -> Result<Array1<f64>> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| if p >= threshold { 1.0 } else { 0.0 }))
    }

    /// Summary of the fitted parameters, if the model exposes one.
    fn summary(&self) -> Option<crate::models::logistic::LogitFit> {
        None
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
