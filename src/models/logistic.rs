use ndarray::{concatenate, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::config::{LogitConfig, Solver};
use crate::error::{ConvergenceReason, Result, ValidationError};
use crate::math::{cholesky_solve, log_likelihood, sigmoid, spd_inverse};
use crate::models::classifier_trait::BinaryClassifier;

/// Name given to the constant term in coefficient tables.
pub const INTERCEPT_NAME: &str = "intercept";

/// One row of the coefficient table of a fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoefficientSummary {
    pub name: String,
    pub estimate: f64,
    /// `None` when the Hessian at the optimum could not be inverted
    pub std_error: Option<f64>,
    pub z_value: Option<f64>,
    /// Two-sided Wald p-value
    pub p_value: Option<f64>,
}

/// Parameters and fit statistics of a maximum-likelihood logistic model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogitFit {
    pub intercept: Option<f64>,
    /// Slopes, one per predictor column
    pub coefficients: Array1<f64>,
    pub coefficient_table: Vec<CoefficientSummary>,
    pub iterations: usize,
    pub log_likelihood: f64,
    /// Log-likelihood of the intercept-only (or all-0.5) model
    pub null_log_likelihood: f64,
    /// McFadden's pseudo R^2, `1 - ll / ll_null`
    pub pseudo_r2: f64,
    pub n_observations: usize,
    pub solver: Solver,
}

impl LogitFit {
    /// Full parameter vector, intercept first when present.
    pub fn params(&self) -> Array1<f64> {
        match self.intercept {
            Some(b0) => std::iter::once(b0)
                .chain(self.coefficients.iter().copied())
                .collect(),
            None => self.coefficients.clone(),
        }
    }
}

/// Binary logistic regression fitted by maximum likelihood.
pub struct LogisticRegression {
    config: LogitConfig,
    fitted: Option<LogitFit>,
}

impl LogisticRegression {
    pub fn new(config: LogitConfig) -> Self {
        LogisticRegression {
            config,
            fitted: None,
        }
    }

    pub fn fitted(&self) -> Option<&LogitFit> {
        self.fitted.as_ref()
    }

    fn design_matrix(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.config.fit_intercept {
            return Ok(x.clone());
        }
        let ones = Array2::<f64>::ones((x.nrows(), 1));
        concatenate(Axis(1), &[ones.view(), x.view()])
            .map_err(|e| ValidationError::invalid_argument(format!("design matrix: {}", e)))
    }

    fn newton(&self, design: &Array2<f64>, y: &Array1<f64>, max_iter: usize) -> Result<(Array1<f64>, usize)> {
        let mut beta = Array1::<f64>::zeros(design.ncols());

        for iter in 1..=max_iter {
            let mu = design.dot(&beta).mapv(sigmoid);
            let gradient = design.t().dot(&(y - &mu));
            let weights = mu.mapv(|m| m * (1.0 - m));
            let weighted = design * &weights.view().insert_axis(Axis(1));
            let hessian = design.t().dot(&weighted);

            let step = cholesky_solve(&hessian, &gradient).ok_or(ValidationError::Convergence {
                reason: ConvergenceReason::SingularHessian,
                iterations: iter - 1,
            })?;
            beta += &step;

            let max_change = step.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
            log::debug!("Newton iteration {}: max |step| = {:.3e}", iter, max_change);

            check_iterate(design, y, &beta, iter)?;
            if max_change < self.config.tol {
                return Ok((beta, iter));
            }
        }

        Err(ValidationError::Convergence {
            reason: ConvergenceReason::MaxIterations,
            iterations: max_iter,
        })
    }

    fn gradient_descent(
        &self,
        design: &Array2<f64>,
        y: &Array1<f64>,
        learning_rate: f64,
        max_iter: usize,
    ) -> Result<(Array1<f64>, usize)> {
        let n = design.nrows() as f64;
        let mut beta = Array1::<f64>::zeros(design.ncols());

        for iter in 1..=max_iter {
            let mu = design.dot(&beta).mapv(sigmoid);
            let step = design.t().dot(&(y - &mu)) * (learning_rate / n);
            beta += &step;

            let max_change = step.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
            if iter % 1000 == 0 {
                log::debug!("Gradient descent iteration {}: max |step| = {:.3e}", iter, max_change);
            }

            check_iterate(design, y, &beta, iter)?;
            if max_change < self.config.tol {
                return Ok((beta, iter));
            }
        }

        Err(ValidationError::Convergence {
            reason: ConvergenceReason::MaxIterations,
            iterations: max_iter,
        })
    }

    fn summarize(
        &self,
        design: &Array2<f64>,
        y: &Array1<f64>,
        beta: Array1<f64>,
        iterations: usize,
        feature_names: &[String],
    ) -> Result<LogitFit> {
        let eta = design.dot(&beta);
        let ll = log_likelihood(&eta, y);
        if !ll.is_finite() {
            return Err(ValidationError::Convergence {
                reason: ConvergenceReason::NonFinite,
                iterations,
            });
        }

        let n = y.len() as f64;
        let ll_null = if self.config.fit_intercept {
            let p = y.sum() / n;
            n * (p * p.ln() + (1.0 - p) * (1.0 - p).ln())
        } else {
            n * 0.5f64.ln()
        };

        let mu = eta.mapv(sigmoid);
        let weights = mu.mapv(|m| m * (1.0 - m));
        let hessian = design.t().dot(&(design * &weights.view().insert_axis(Axis(1))));
        let covariance = spd_inverse(&hessian);
        if covariance.is_none() {
            log::warn!("Hessian at the optimum is not invertible, standard errors unavailable");
        }

        let names: Vec<String> = if self.config.fit_intercept {
            std::iter::once(INTERCEPT_NAME.to_string())
                .chain(feature_names.iter().cloned())
                .collect()
        } else {
            feature_names.to_vec()
        };

        let normal = Normal::new(0.0, 1.0).ok();
        let coefficient_table = names
            .into_iter()
            .enumerate()
            .map(|(j, name)| {
                let estimate = beta[j];
                let std_error = covariance
                    .as_ref()
                    .map(|cov| cov[(j, j)].sqrt())
                    .filter(|se| se.is_finite() && *se > 0.0);
                let z_value = std_error.map(|se| estimate / se);
                let p_value = match (z_value, normal.as_ref()) {
                    (Some(z), Some(dist)) => Some(2.0 * dist.cdf(-z.abs())),
                    _ => None,
                };
                CoefficientSummary {
                    name,
                    estimate,
                    std_error,
                    z_value,
                    p_value,
                }
            })
            .collect();

        let (intercept, coefficients) = if self.config.fit_intercept {
            (Some(beta[0]), beta.slice(ndarray::s![1..]).to_owned())
        } else {
            (None, beta)
        };

        Ok(LogitFit {
            intercept,
            coefficients,
            coefficient_table,
            iterations,
            log_likelihood: ll,
            null_log_likelihood: ll_null,
            pseudo_r2: 1.0 - ll / ll_null,
            n_observations: y.len(),
            solver: self.config.solver,
        })
    }
}

/// Fail on non-finite coefficients or when the current coefficients already
/// separate the classes, since the likelihood then has no finite maximum.
fn check_iterate(design: &Array2<f64>, y: &Array1<f64>, beta: &Array1<f64>, iter: usize) -> Result<()> {
    if !beta.iter().all(|b| b.is_finite()) {
        return Err(ValidationError::Convergence {
            reason: ConvergenceReason::NonFinite,
            iterations: iter,
        });
    }

    let eta = design.dot(beta);
    let separated = eta
        .iter()
        .zip(y.iter())
        .all(|(&e, &t)| if t == 1.0 { e > 0.0 } else { e < 0.0 });
    if separated {
        return Err(ValidationError::Convergence {
            reason: ConvergenceReason::PerfectSeparation,
            iterations: iter,
        });
    }
    Ok(())
}

impl BinaryClassifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, feature_names: &[String]) -> Result<()> {
        self.fitted = None;
        self.config.validate()?;

        if x.nrows() != y.len() {
            return Err(ValidationError::LengthMismatch {
                predictors: x.nrows(),
                targets: y.len(),
            });
        }
        if x.nrows() == 0 {
            return Err(ValidationError::invalid_argument("cannot fit on zero rows"));
        }
        let generated: Vec<String>;
        let feature_names = if feature_names.is_empty() {
            generated = (1..=x.ncols()).map(|i| format!("x{}", i)).collect();
            &generated[..]
        } else {
            feature_names
        };
        if feature_names.len() != x.ncols() {
            return Err(ValidationError::invalid_argument(format!(
                "{} feature names for {} predictor columns",
                feature_names.len(),
                x.ncols()
            )));
        }

        let positives = y.iter().filter(|&&v| v == 1.0).count();
        if positives == 0 || positives == y.len() {
            return Err(ValidationError::Convergence {
                reason: ConvergenceReason::SingleClass,
                iterations: 0,
            });
        }

        let design = self.design_matrix(x)?;
        let max_iter = self.config.solver.max_iter();
        let (beta, iterations) = match self.config.solver {
            Solver::Newton { .. } => self.newton(&design, y, max_iter)?,
            Solver::GradientDescent { learning_rate, .. } => {
                self.gradient_descent(&design, y, learning_rate, max_iter)?
            }
        };

        let fit = self.summarize(&design, y, beta, iterations, feature_names)?;
        log::debug!(
            "Logit converged in {} iterations, log-likelihood {:.4}, pseudo R^2 {:.4}",
            fit.iterations,
            fit.log_likelihood,
            fit.pseudo_r2
        );
        self.fitted = Some(fit);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let fit = self
            .fitted
            .as_ref()
            .ok_or_else(|| ValidationError::invalid_argument("model has not been fitted"))?;
        if x.ncols() != fit.coefficients.len() {
            return Err(ValidationError::invalid_argument(format!(
                "model fitted on {} predictors, got {}",
                fit.coefficients.len(),
                x.ncols()
            )));
        }
        let eta = x.dot(&fit.coefficients) + fit.intercept.unwrap_or(0.0);
        Ok(eta.mapv(sigmoid))
    }

    fn summary(&self) -> Option<LogitFit> {
        self.fitted.clone()
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}
