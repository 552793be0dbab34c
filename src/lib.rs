//! fold-validator: V-fold cross-validation for binary logistic regression.
//!
//! Every row of a predictor table is assigned a random fold id in `1..=V`.
//! For each fold a logistic regression is fitted on the remaining rows and
//! scored on the held-out ones; the per-fold fits, metrics and an aggregate
//! summary are returned as a [`validator::CrossValidationReport`].
//!
//! ```no_run
//! use fold_validator::config::ValidatorConfig;
//! use fold_validator::data_handling::simulate_logistic;
//! use fold_validator::folds::rng_from_seed;
//! use fold_validator::validator::FoldValidator;
//!
//! let mut rng = rng_from_seed(Some(42));
//! let data = simulate_logistic(200, &[1.5, -2.0], 0.3, &mut rng).unwrap();
//! let report = FoldValidator::new(ValidatorConfig::new(5, Some(7)))
//!     .cross_validate(&data)
//!     .unwrap();
//! println!("{:?}", report.summary);
//! ```
pub mod config;
pub mod data_handling;
pub mod error;
pub mod folds;
pub mod io;
pub mod math;
pub mod metrics;
pub mod models;
pub mod preprocessing;
pub mod report;
pub mod validator;

pub use error::{ConvergenceReason, Result, ValidationError};
pub use validator::{cross_validate, CrossValidationReport, FoldValidator};
