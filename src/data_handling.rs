//! Row-aligned predictor table, binary target and fold column.
//!
//! This module defines `Dataset`, which keeps the feature matrix, the target
//! vector, the original row numbers and the fold labels in lockstep. Filtering
//! and fold splits always go through row selection so the columns can never
//! drift apart.
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use statrs::distribution::Normal;

use crate::error::{Result, ValidationError};
use crate::folds;
use crate::math::sigmoid;

#[derive(Debug, Clone)]
pub struct Dataset {
    /// Predictor table, shape (n_samples, n_features)
    pub x: Array2<f64>,
    /// Binary target, 0.0 or 1.0 per row
    pub y: Array1<f64>,
    /// Row number of each observation in the table the dataset was built from
    pub row_id: Array1<usize>,
    /// Fold label per row, 0 until folds are assigned
    pub fold: Array1<usize>,
    pub n_folds: usize,
    pub feature_names: Vec<String>,
}

impl Dataset {
    /// Build a dataset from a predictor table and an aligned target vector.
    ///
    /// Fails when the row counts differ, the table is empty, a predictor is
    /// not finite, or a target is anything other than 0 or 1.
    pub fn new(x: Array2<f64>, y: Array1<f64>, feature_names: Vec<String>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(ValidationError::LengthMismatch {
                predictors: x.nrows(),
                targets: y.len(),
            });
        }
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ValidationError::invalid_argument(format!(
                "predictor table must be non-empty, got shape ({}, {})",
                x.nrows(),
                x.ncols()
            )));
        }
        if feature_names.len() != x.ncols() {
            return Err(ValidationError::invalid_argument(format!(
                "{} feature names for {} predictor columns",
                feature_names.len(),
                x.ncols()
            )));
        }
        if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ValidationError::invalid_argument(format!(
                "non-finite predictor value at row {}, column '{}'",
                row, feature_names[col]
            )));
        }
        if let Some((row, value)) = y
            .iter()
            .enumerate()
            .find(|&(_, &v)| v != 0.0 && v != 1.0)
        {
            return Err(ValidationError::invalid_argument(format!(
                "target must be 0 or 1, found {} at row {}",
                value, row
            )));
        }

        let n_samples = x.nrows();
        Ok(Dataset {
            x,
            y,
            row_id: (0..n_samples).collect(),
            fold: Array1::zeros(n_samples),
            n_folds: 0,
            feature_names,
        })
    }

    /// Build a dataset with generated feature names `x1..xp`.
    pub fn from_arrays(x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        let names = (1..=x.ncols()).map(|i| format!("x{}", i)).collect();
        Dataset::new(x, y, names)
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    /// (negatives, positives)
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.y.iter().filter(|&&v| v == 1.0).count();
        (self.y.len() - positives, positives)
    }

    pub fn log_input_data_summary(&self) {
        let (negatives, positives) = self.class_counts();
        log::info!(
            "Input data: {} rows ({} positive, {} negative), {} predictors: {:?}",
            self.nrows(),
            positives,
            negatives,
            self.ncols(),
            self.feature_names
        );
    }

    /// Draw a fresh fold label for every row and attach it as the fold column.
    pub fn assign_folds<R: Rng + ?Sized>(&mut self, n_folds: usize, rng: &mut R) -> Result<()> {
        let labels = folds::assign_folds(self.nrows(), n_folds, rng)?;
        self.fold = labels;
        self.n_folds = n_folds;
        Ok(())
    }

    /// Attach a precomputed fold assignment.
    pub fn set_folds(&mut self, labels: Array1<usize>, n_folds: usize) -> Result<()> {
        if labels.len() != self.nrows() {
            return Err(ValidationError::invalid_argument(format!(
                "fold assignment has {} labels for {} rows",
                labels.len(),
                self.nrows()
            )));
        }
        folds::validate_assignment(&labels, n_folds)?;
        self.fold = labels;
        self.n_folds = n_folds;
        Ok(())
    }

    /// Keep only the rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
            row_id: self.row_id.select(Axis(0), indices),
            fold: self.fold.select(Axis(0), indices),
            n_folds: self.n_folds,
            feature_names: self.feature_names.clone(),
        }
    }

    /// Keep only the rows where `mask[i]` is true.
    pub fn filter(&self, mask: &[bool]) -> Dataset {
        let selected: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| if keep { Some(i) } else { None })
            .collect();
        self.select(&selected)
    }

    /// Split into (train, test) for `fold`: test holds the rows labelled
    /// `fold`, train holds every other row.
    pub fn split_fold(&self, fold: usize) -> Result<(Dataset, Dataset)> {
        if self.n_folds == 0 {
            return Err(ValidationError::invalid_argument(
                "folds have not been assigned",
            ));
        }
        if fold == 0 || fold > self.n_folds {
            return Err(ValidationError::invalid_argument(format!(
                "fold {} is outside 1..={}",
                fold, self.n_folds
            )));
        }

        let (train_idx, test_idx) = folds::split_indices(&self.fold, fold);
        folds::check_partition(fold, train_idx.len(), test_idx.len())?;

        let train = self.select(&train_idx);
        let test = self.select(&test_idx);

        log::trace!(
            "Preparing fold {} with {} training rows ({} positive) and {} test rows ({} positive)",
            fold,
            train.nrows(),
            train.class_counts().1,
            test.nrows(),
            test.class_counts().1
        );

        Ok((train, test))
    }
}

/// Simulate a logistic data set with standard normal predictors.
///
/// Each target is drawn from Bernoulli(sigmoid(intercept + x . coefficients)).
///
/// # Arguments
///
/// * `n_samples` - Number of rows
/// * `coefficients` - One slope per predictor column
/// * `intercept` - Constant term of the linear predictor
/// * `rng` - Random source
pub fn simulate_logistic<R: Rng + ?Sized>(
    n_samples: usize,
    coefficients: &[f64],
    intercept: f64,
    rng: &mut R,
) -> Result<Dataset> {
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ValidationError::invalid_argument(e.to_string()))?;
    let n_features = coefficients.len();

    let mut x = Array2::<f64>::zeros((n_samples, n_features));
    x.mapv_inplace(|_| rng.sample(&normal));

    let beta = Array1::from(coefficients.to_vec());
    let eta = x.dot(&beta) + intercept;
    let y = eta.mapv(|e| if rng.gen::<f64>() < sigmoid(e) { 1.0 } else { 0.0 });

    Dataset::from_arrays(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small() -> Dataset {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0, 1.0];
        Dataset::from_arrays(x, y).unwrap()
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let x = Array2::<f64>::zeros((3, 2));
        let y = array![0.0, 1.0];
        assert!(matches!(
            Dataset::from_arrays(x, y),
            Err(ValidationError::LengthMismatch {
                predictors: 3,
                targets: 2
            })
        ));
    }

    #[test]
    fn test_new_rejects_non_binary_target() {
        let x = Array2::<f64>::zeros((3, 1));
        let y = array![0.0, 2.0, 1.0];
        assert!(matches!(
            Dataset::from_arrays(x, y),
            Err(ValidationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_new_rejects_nan_predictor() {
        let x = array![[1.0], [f64::NAN]];
        let y = array![0.0, 1.0];
        assert!(Dataset::from_arrays(x, y).is_err());
    }

    #[test]
    fn test_split_fold_by_label() {
        let mut data = small();
        data.set_folds(array![1, 2, 1, 2, 2], 2).unwrap();
        let (train, test) = data.split_fold(2).unwrap();
        assert_eq!(test.row_id.to_vec(), vec![1, 3, 4]);
        assert_eq!(train.row_id.to_vec(), vec![0, 2]);
        assert_eq!(test.x.row(1).to_vec(), vec![3.0, 0.0]);
        assert!(train.fold.iter().all(|&f| f == 1));
    }

    #[test]
    fn test_split_fold_empty_partition() {
        let mut data = small();
        data.set_folds(array![1, 1, 1, 1, 1], 2).unwrap();
        assert!(matches!(
            data.split_fold(2),
            Err(ValidationError::InsufficientData {
                fold: 2,
                train_rows: 5,
                test_rows: 0
            })
        ));
        assert!(matches!(
            data.split_fold(1),
            Err(ValidationError::InsufficientData {
                fold: 1,
                train_rows: 0,
                test_rows: 5
            })
        ));
    }

    #[test]
    fn test_split_requires_assignment() {
        let data = small();
        assert!(data.split_fold(1).is_err());
    }

    #[test]
    fn test_filter_keeps_alignment() {
        let data = small();
        let kept = data.filter(&[true, false, false, true, true]);
        assert_eq!(kept.nrows(), 3);
        assert_eq!(kept.y.to_vec(), vec![0.0, 1.0, 1.0]);
        assert_eq!(kept.row_id.to_vec(), vec![0, 3, 4]);
    }

    #[test]
    fn test_simulate_logistic_shape() {
        let mut rng = folds::rng_from_seed(Some(5));
        let data = simulate_logistic(50, &[1.0, -1.0, 0.5], 0.0, &mut rng).unwrap();
        assert_eq!(data.x.dim(), (50, 3));
        assert_eq!(data.feature_names, vec!["x1", "x2", "x3"]);
        let (neg, pos) = data.class_counts();
        assert_eq!(neg + pos, 50);
    }
}
