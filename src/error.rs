use std::error::Error;
use std::fmt;

/// Why a logistic fit stopped without producing a usable model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceReason {
    /// Training targets hold a single class, the likelihood has no finite maximum.
    SingleClass,
    /// The current coefficients classify every training row correctly.
    PerfectSeparation,
    /// X'WX is not positive definite (collinear or constant columns).
    SingularHessian,
    NonFinite,
    MaxIterations,
}

impl fmt::Display for ConvergenceReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            ConvergenceReason::SingleClass => "training targets contain a single class",
            ConvergenceReason::PerfectSeparation => "perfect separation detected",
            ConvergenceReason::SingularHessian => "singular Hessian (collinear predictors?)",
            ConvergenceReason::NonFinite => "non-finite coefficients or log-likelihood",
            ConvergenceReason::MaxIterations => "maximum number of iterations reached",
        };
        f.write_str(text)
    }
}

/// Error type shared by fold assignment, model fitting and validation.
#[derive(Debug)]
pub enum ValidationError {
    InvalidArgument(String),
    LengthMismatch {
        predictors: usize,
        targets: usize,
    },
    /// A fold left either the training or the test partition empty.
    InsufficientData {
        fold: usize,
        train_rows: usize,
        test_rows: usize,
    },
    Convergence {
        reason: ConvergenceReason,
        iterations: usize,
    },
    /// Any failure raised while processing a single fold.
    Fold {
        fold: usize,
        source: Box<ValidationError>,
    },
}

pub type Result<T> = std::result::Result<T, ValidationError>;

impl ValidationError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ValidationError::InvalidArgument(msg.into())
    }

    /// Attach a fold id, unless the error already carries one.
    pub fn in_fold(self, fold: usize) -> Self {
        match self {
            ValidationError::Fold { .. } => self,
            other => ValidationError::Fold {
                fold,
                source: Box::new(other),
            },
        }
    }

    /// Fold id this error is attributed to, if any.
    pub fn fold(&self) -> Option<usize> {
        match self {
            ValidationError::Fold { fold, .. } => Some(*fold),
            ValidationError::InsufficientData { fold, .. } => Some(*fold),
            _ => None,
        }
    }

    /// The innermost error with any fold wrapper removed.
    pub fn root(&self) -> &ValidationError {
        match self {
            ValidationError::Fold { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            ValidationError::LengthMismatch { predictors, targets } => write!(
                f,
                "predictor table has {} rows but target vector has {}",
                predictors, targets
            ),
            ValidationError::InsufficientData {
                fold,
                train_rows,
                test_rows,
            } => write!(
                f,
                "insufficient data in fold {}: {} training rows, {} test rows",
                fold, train_rows, test_rows
            ),
            ValidationError::Convergence { reason, iterations } => write!(
                f,
                "logistic regression failed to converge after {} iterations: {}",
                iterations, reason
            ),
            ValidationError::Fold { fold, source } => write!(f, "fold {} failed: {}", fold, source),
        }
    }
}

impl Error for ValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ValidationError::Fold { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
