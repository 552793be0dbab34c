use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Central configuration for a cross-validation run.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Number of folds (V). Fold ids run from 1 to V.
    pub n_folds: usize,
    /// Seed for the fold draws. `None` draws from entropy.
    pub seed: Option<u64>,
    /// Probability at or above which a row is predicted positive.
    pub threshold: f64,
    /// Return the first failing fold as an error instead of collecting failures.
    pub fail_fast: bool,
    /// Process folds on the rayon thread pool.
    pub parallel: bool,
    /// Standardize predictors with statistics of the training partition.
    pub scale_features: bool,
    pub model: LogitConfig,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            n_folds: 5,
            seed: None,
            threshold: 0.5,
            fail_fast: true,
            parallel: false,
            scale_features: false,
            model: LogitConfig::default(),
        }
    }
}

impl ValidatorConfig {
    pub fn new(n_folds: usize, seed: Option<u64>) -> Self {
        Self {
            n_folds,
            seed,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_folds < 2 {
            return Err(ValidationError::invalid_argument(format!(
                "n_folds must be at least 2, got {}",
                self.n_folds
            )));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ValidationError::invalid_argument(format!(
                "threshold must lie in (0, 1), got {}",
                self.threshold
            )));
        }
        self.model.validate()
    }
}

/// Logistic regression fitting options.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct LogitConfig {
    pub solver: Solver,
    /// Convergence tolerance on the largest absolute coefficient update.
    pub tol: f64,
    pub fit_intercept: bool,
}

impl Default for LogitConfig {
    fn default() -> Self {
        Self {
            solver: Solver::default(),
            tol: 1e-8,
            fit_intercept: true,
        }
    }
}

impl LogitConfig {
    pub fn new(solver: Solver) -> Self {
        Self {
            solver,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tol > 0.0) {
            return Err(ValidationError::invalid_argument(format!(
                "tol must be positive, got {}",
                self.tol
            )));
        }
        match self.solver {
            Solver::Newton { max_iter } if max_iter == 0 => Err(
                ValidationError::invalid_argument("Newton max_iter must be positive"),
            ),
            Solver::GradientDescent { max_iter, .. } if max_iter == 0 => Err(
                ValidationError::invalid_argument("gradient descent max_iter must be positive"),
            ),
            Solver::GradientDescent { learning_rate, .. } if !(learning_rate > 0.0) => {
                Err(ValidationError::invalid_argument(format!(
                    "learning_rate must be positive, got {}",
                    learning_rate
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Supported optimizers and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub enum Solver {
    /// Newton-Raphson (IRLS) on the full log-likelihood.
    Newton { max_iter: usize },
    /// Batch gradient ascent on the mean log-likelihood.
    GradientDescent { learning_rate: f64, max_iter: usize },
}

impl Solver {
    pub fn max_iter(&self) -> usize {
        match self {
            Solver::Newton { max_iter } => *max_iter,
            Solver::GradientDescent { max_iter, .. } => *max_iter,
        }
    }
}

impl Default for Solver {
    fn default() -> Self {
        Solver::Newton { max_iter: 35 }
    }
}

impl FromStr for Solver {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newton" | "irls" => Ok(Solver::Newton { max_iter: 35 }),
            "gd" | "gradient_descent" => Ok(Solver::GradientDescent {
                learning_rate: 0.1,
                max_iter: 10_000,
            }),
            _ => Err(format!(
                "Unknown solver: {}. Valid options are: newton, gradient_descent",
                s
            )),
        }
    }
}

/// Load a validator configuration from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<ValidatorConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: ValidatorConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ValidatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.n_folds, 5);
        assert_eq!(config.model.solver, Solver::Newton { max_iter: 35 });
    }

    #[test]
    fn test_rejects_single_fold() {
        let config = ValidatorConfig::new(1, Some(0));
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rejects_bad_learning_rate() {
        let mut config = ValidatorConfig::default();
        config.model.solver = Solver::GradientDescent {
            learning_rate: 0.0,
            max_iter: 10,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_solver_from_str() {
        assert_eq!("Newton".parse::<Solver>().unwrap(), Solver::Newton { max_iter: 35 });
        assert!(matches!(
            "gd".parse::<Solver>().unwrap(),
            Solver::GradientDescent { .. }
        ));
        assert!("lbfgs".parse::<Solver>().is_err());
        assert_eq!("irls".parse::<Solver>().unwrap().max_iter(), 35);
        assert_eq!("gd".parse::<Solver>().unwrap().max_iter(), 10_000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ValidatorConfig = serde_json::from_str(r#"{"n_folds": 3, "seed": 7}"#).unwrap();
        assert_eq!(config.n_folds, 3);
        assert_eq!(config.seed, Some(7));
        assert!(config.fail_fast);
        assert!(config.model.fit_intercept);
    }
}
