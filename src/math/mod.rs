//! Numeric helpers for the logistic model.
//!
//! Provides a numerically stable sigmoid and log-likelihood, plus a small
//! Cholesky solver for the symmetric positive definite systems that appear in
//! Newton steps. Everything operates on `ndarray` types.
pub mod linalg;

pub use linalg::{cholesky_solve, spd_inverse};

use ndarray::Array1;

/// Logistic function, evaluated without overflow for large |z|.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + exp(z))` without overflow.
pub fn log1p_exp(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Bernoulli log-likelihood of `y` given the linear predictor `eta`.
///
/// Uses `y * eta - ln(1 + exp(eta))`, which stays finite when the fitted
/// probabilities saturate at 0 or 1.
pub fn log_likelihood(eta: &Array1<f64>, y: &Array1<f64>) -> f64 {
    eta.iter()
        .zip(y.iter())
        .map(|(&e, &t)| t * e - log1p_exp(e))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sigmoid_symmetry_and_extremes() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
    }

    #[test]
    fn test_log1p_exp_large_arguments() {
        assert!((log1p_exp(800.0) - 800.0).abs() < 1e-9);
        assert!(log1p_exp(-800.0) >= 0.0);
        assert!((log1p_exp(0.0) - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_log_likelihood_at_zero() {
        let eta = array![0.0, 0.0, 0.0, 0.0];
        let y = array![1.0, 0.0, 1.0, 0.0];
        let ll = log_likelihood(&eta, &y);
        assert!((ll - 4.0 * 0.5f64.ln()).abs() < 1e-12);
    }
}
