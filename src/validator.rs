//! The per-fold fit/evaluate loop.
//!
//! `FoldValidator` draws (or receives) a fold label per row, and for each
//! fold id fits a fresh classifier on every other fold before scoring it on
//! the held-out rows. Folds never share a model.
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::ValidatorConfig;
use crate::data_handling::Dataset;
use crate::error::{ConvergenceReason, Result, ValidationError};
use crate::folds;
use crate::metrics::{AggregateMetrics, FoldMetrics};
use crate::models::{BinaryClassifier, LogisticRegression, LogitFit};
use crate::preprocessing;

/// Outcome of one fold that was fitted and evaluated.
#[derive(Debug, Clone, Serialize)]
pub struct FoldResult {
    pub fold: usize,
    pub n_train: usize,
    pub n_test: usize,
    /// Fitted parameters, when the classifier exposes them
    pub fit: Option<LogitFit>,
    pub metrics: FoldMetrics,
    /// Positions of the held-out rows in the validated dataset
    pub test_rows: Vec<usize>,
    /// Predicted positive-class probability per held-out row
    pub probabilities: Array1<f64>,
}

/// A fold that could not be fitted or evaluated.
#[derive(Debug, Clone, Serialize)]
pub struct FoldFailure {
    pub fold: usize,
    pub reason: Option<ConvergenceReason>,
    pub message: String,
}

impl FoldFailure {
    fn from_error(fold: usize, err: &ValidationError) -> Self {
        let root = err.root();
        let reason = match root {
            ValidationError::Convergence { reason, .. } => Some(*reason),
            _ => None,
        };
        FoldFailure {
            fold,
            reason,
            message: root.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossValidationReport {
    pub config: ValidatorConfig,
    pub n_rows: usize,
    pub feature_names: Vec<String>,
    /// Fold label per row, in `1..=n_folds`
    pub assignments: Array1<usize>,
    /// Row count per fold; entry `f - 1` belongs to fold `f`
    pub fold_sizes: Vec<usize>,
    /// Successful folds in fold order
    pub folds: Vec<FoldResult>,
    pub failures: Vec<FoldFailure>,
    /// `None` when no fold succeeded
    pub summary: Option<AggregateMetrics>,
    /// Held-out probability per row, NaN where the row's fold failed
    pub out_of_fold: Array1<f64>,
}

impl CrossValidationReport {
    pub fn n_folds(&self) -> usize {
        self.config.n_folds
    }

    /// True when every fold produced a result.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_folds(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.fold).collect()
    }

    pub fn fold(&self, fold: usize) -> Option<&FoldResult> {
        self.folds.iter().find(|r| r.fold == fold)
    }
}

pub struct FoldValidator {
    config: ValidatorConfig,
}

impl FoldValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        FoldValidator { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Draw fold labels from the configured seed and validate a logistic
    /// regression on every fold.
    pub fn cross_validate(&self, dataset: &Dataset) -> Result<CrossValidationReport> {
        self.config.validate()?;
        let mut rng = folds::rng_from_seed(self.config.seed);
        let labels = folds::assign_folds(dataset.nrows(), self.config.n_folds, &mut rng)?;
        log::info!(
            "Assigned {} rows to {} folds (seed: {:?})",
            dataset.nrows(),
            self.config.n_folds,
            self.config.seed
        );
        self.cross_validate_with_folds(dataset, &labels)
    }

    /// Validate a logistic regression on a precomputed fold assignment.
    pub fn cross_validate_with_folds(
        &self,
        dataset: &Dataset,
        fold_labels: &Array1<usize>,
    ) -> Result<CrossValidationReport> {
        let model_config = self.config.model.clone();
        self.cross_validate_with(dataset, fold_labels, move || {
            LogisticRegression::new(model_config.clone())
        })
    }

    /// Validate any classifier on a precomputed fold assignment.
    ///
    /// # Arguments
    ///
    /// * `dataset` - Predictors and target, already validated
    /// * `fold_labels` - One fold id in `1..=n_folds` per row
    /// * `make_model` - Builds a fresh, unfitted classifier for each fold
    ///
    /// # Returns
    ///
    /// The report of all folds. With `fail_fast` the first failing fold (by
    /// fold id) is returned as `ValidationError::Fold` instead.
    pub fn cross_validate_with<M, F>(
        &self,
        dataset: &Dataset,
        fold_labels: &Array1<usize>,
        make_model: F,
    ) -> Result<CrossValidationReport>
    where
        M: BinaryClassifier,
        F: Fn() -> M + Sync,
    {
        self.config.validate()?;
        let n_folds = self.config.n_folds;

        let mut data = dataset.clone();
        data.set_folds(fold_labels.clone(), n_folds)?;
        data.log_input_data_summary();

        let run = |fold: usize| {
            self.run_fold(&data, fold, &make_model)
                .map_err(|e| e.in_fold(fold))
        };
        let fold_ids: Vec<usize> = (1..=n_folds).collect();

        let outcomes: Vec<Result<FoldResult>> = if self.config.parallel {
            fold_ids.par_iter().map(|&fold| run(fold)).collect()
        } else if self.config.fail_fast {
            let mut outcomes = Vec::with_capacity(n_folds);
            for &fold in &fold_ids {
                let outcome = run(fold);
                let failed = outcome.is_err();
                outcomes.push(outcome);
                if failed {
                    break;
                }
            }
            outcomes
        } else {
            fold_ids.iter().map(|&fold| run(fold)).collect()
        };

        let mut results = Vec::with_capacity(n_folds);
        let mut failures = Vec::new();
        for (fold, outcome) in fold_ids.iter().copied().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(err) if self.config.fail_fast => return Err(err),
                Err(err) => {
                    log::warn!("{}", err);
                    failures.push(FoldFailure::from_error(fold, &err));
                }
            }
        }

        self.build_report(&data, results, failures)
    }

    fn run_fold<M, F>(&self, data: &Dataset, fold: usize, make_model: &F) -> Result<FoldResult>
    where
        M: BinaryClassifier,
        F: Fn() -> M,
    {
        let (train, test) = data.split_fold(fold)?;
        let (_, test_rows) = folds::split_indices(&data.fold, fold);

        log::info!(
            "Cross-validating fold {}/{} with {} training rows and {} test rows",
            fold,
            self.config.n_folds,
            train.nrows(),
            test.nrows()
        );

        let (x_train, x_test) = if self.config.scale_features {
            let (scaler, x_train) = preprocessing::fit_transform(&train.x)?;
            let x_test = scaler.transform(&test.x)?;
            (x_train, x_test)
        } else {
            (train.x, test.x)
        };

        let mut model = make_model();
        log::debug!("Fitting {} on fold {}", model.name(), fold);
        model.fit(&x_train, &train.y, &train.feature_names)?;
        let probabilities = model.predict_proba(&x_test)?;
        let metrics = FoldMetrics::compute(&test.y, &probabilities, self.config.threshold)?;

        log::info!(
            "Fold {}: accuracy {:.4}, log-loss {:.4}, AUC {}",
            fold,
            metrics.accuracy,
            metrics.log_loss,
            metrics
                .roc_auc
                .map_or_else(|| "n/a".to_string(), |auc| format!("{:.4}", auc))
        );

        Ok(FoldResult {
            fold,
            n_train: x_train.nrows(),
            n_test: x_test.nrows(),
            fit: model.summary(),
            metrics,
            test_rows,
            probabilities,
        })
    }

    fn build_report(
        &self,
        data: &Dataset,
        results: Vec<FoldResult>,
        failures: Vec<FoldFailure>,
    ) -> Result<CrossValidationReport> {
        let mut out_of_fold = Array1::from_elem(data.nrows(), f64::NAN);
        for result in &results {
            for (&row, &p) in result.test_rows.iter().zip(result.probabilities.iter()) {
                out_of_fold[row] = p;
            }
        }

        let summary = if results.is_empty() {
            None
        } else {
            let pooled_rows: Vec<usize> = results
                .iter()
                .flat_map(|r| r.test_rows.iter().copied())
                .collect();
            let pooled_y = data.y.select(Axis(0), &pooled_rows);
            let pooled_p = out_of_fold.select(Axis(0), &pooled_rows);
            let per_fold: Vec<&FoldMetrics> = results.iter().map(|r| &r.metrics).collect();
            Some(AggregateMetrics::compute(
                &per_fold,
                &pooled_y,
                &pooled_p,
                self.config.threshold,
            )?)
        };

        match &summary {
            Some(s) => log::info!(
                "Cross-validation finished: {}/{} folds succeeded, accuracy {:.4} +/- {:.4}, log-loss {:.4} +/- {:.4}",
                s.n_folds,
                self.config.n_folds,
                s.mean_accuracy,
                s.std_accuracy,
                s.mean_log_loss,
                s.std_log_loss
            ),
            None => log::warn!(
                "Cross-validation finished: none of the {} folds succeeded",
                self.config.n_folds
            ),
        }

        Ok(CrossValidationReport {
            config: self.config.clone(),
            n_rows: data.nrows(),
            feature_names: data.feature_names.clone(),
            assignments: data.fold.clone(),
            fold_sizes: folds::fold_sizes(&data.fold, self.config.n_folds),
            folds: results,
            failures,
            summary,
            out_of_fold,
        })
    }
}

/// Cross-validate a logistic regression on raw arrays with default settings.
///
/// Feature names are generated as `x1..xp`.
pub fn cross_validate(
    x: Array2<f64>,
    y: Array1<f64>,
    n_folds: usize,
    seed: Option<u64>,
) -> Result<CrossValidationReport> {
    let dataset = Dataset::from_arrays(x, y)?;
    FoldValidator::new(ValidatorConfig::new(n_folds, seed)).cross_validate(&dataset)
}
