//! Column standardization fitted on a training partition.
//!
//! The validator fits a `Scaler` on each fold's training rows and applies the
//! same statistics to that fold's test rows.

use ndarray::{Array1, Array2, Axis};

use crate::error::{Result, ValidationError};

/// Standard scaler (per-column mean/std).
#[derive(Clone, Debug)]
pub struct Scaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl Scaler {
    /// Minimum stddev to avoid division by zero when transforming.
    const MIN_STD: f64 = 1e-12;

    /// Fit column means and population standard deviations.
    pub fn fit(x: &Array2<f64>) -> Result<Scaler> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ValidationError::invalid_argument(
                "cannot fit a scaler on an empty matrix",
            ));
        }
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ValidationError::invalid_argument("empty matrix"))?;
        let std = x.std_axis(Axis(0), 0.0).mapv(|s| s.max(Scaler::MIN_STD));
        Ok(Scaler { mean, std })
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(ValidationError::invalid_argument(format!(
                "scaler fitted on {} columns, got {}",
                self.mean.len(),
                x.ncols()
            )));
        }
        Ok((x - &self.mean) / &self.std)
    }
}

/// Fit a scaler and return the transformed matrix in one call.
pub fn fit_transform(x: &Array2<f64>) -> Result<(Scaler, Array2<f64>)> {
    let scaler = Scaler::fit(x)?;
    let transformed = scaler.transform(x)?;
    Ok((scaler, transformed))
}
