//! Integration tests for the maximum-likelihood logistic regression.

use fold_validator::config::{LogitConfig, Solver};
use fold_validator::data_handling::simulate_logistic;
use fold_validator::folds::rng_from_seed;
use fold_validator::models::{BinaryClassifier, LogisticRegression};
use fold_validator::{ConvergenceReason, ValidationError};
use ndarray::{array, Array1};

#[test]
fn newton_recovers_simulated_coefficients() {
    let mut rng = rng_from_seed(Some(8));
    let data = simulate_logistic(5000, &[1.0, -0.5], 0.25, &mut rng).unwrap();

    let mut model = LogisticRegression::new(LogitConfig::default());
    model.fit(&data.x, &data.y, &data.feature_names).unwrap();
    assert_eq!(model.name(), "logistic_regression");
    let fit = model.fitted().unwrap();

    assert!((fit.intercept.unwrap() - 0.25).abs() < 0.15);
    assert!((fit.coefficients[0] - 1.0).abs() < 0.15);
    assert!((fit.coefficients[1] + 0.5).abs() < 0.15);
    assert!(fit.iterations < 15);
    assert_eq!(fit.n_observations, 5000);

    let names: Vec<&str> = fit.coefficient_table.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["intercept", "x1", "x2"]);
    for row in &fit.coefficient_table[1..] {
        assert!(row.p_value.unwrap() < 1e-6);
        assert!(row.std_error.unwrap() < 0.1);
    }
}

#[test]
fn newton_and_gradient_descent_agree() {
    let mut rng = rng_from_seed(Some(21));
    let data = simulate_logistic(200, &[0.8, -0.6], -0.2, &mut rng).unwrap();

    let mut newton = LogisticRegression::new(LogitConfig::default());
    newton.fit(&data.x, &data.y, &[]).unwrap();

    let mut gd = LogisticRegression::new(LogitConfig {
        solver: Solver::GradientDescent {
            learning_rate: 0.5,
            max_iter: 100_000,
        },
        tol: 1e-10,
        fit_intercept: true,
    });
    gd.fit(&data.x, &data.y, &[]).unwrap();

    let a = newton.fitted().unwrap().params();
    let b = gd.fitted().unwrap().params();
    for (p, q) in a.iter().zip(b.iter()) {
        assert!((p - q).abs() < 1e-4, "newton {} vs gradient descent {}", p, q);
    }
}

#[test]
fn currency_scale_column_fits_like_unit_scale() {
    let mut rng = rng_from_seed(Some(8));
    let data = simulate_logistic(500, &[1.0, -0.5], 0.25, &mut rng).unwrap();
    let mut x = data.x.clone();
    x.column_mut(0).mapv_inplace(|v| 1e5 * v + 2e5);

    let mut unit = LogisticRegression::new(LogitConfig::default());
    unit.fit(&data.x, &data.y, &[]).unwrap();
    let mut currency = LogisticRegression::new(LogitConfig::default());
    currency.fit(&x, &data.y, &[]).unwrap();

    let unit_fit = unit.fitted().unwrap();
    let currency_fit = currency.fitted().unwrap();
    assert!((currency_fit.coefficients[0] * 1e5 - unit_fit.coefficients[0]).abs() < 1e-6);
    assert!((currency_fit.coefficients[1] - unit_fit.coefficients[1]).abs() < 1e-6);
    assert!(currency_fit.coefficient_table[1].std_error.unwrap() > 0.0);

    let p = unit.predict_proba(&data.x).unwrap();
    let q = currency.predict_proba(&x).unwrap();
    for (a, b) in p.iter().zip(q.iter()) {
        assert!((a - b).abs() < 1e-8);
    }
}

#[test]
fn duplicated_currency_column_is_singular() {
    let mut rng = rng_from_seed(Some(8));
    let data = simulate_logistic(500, &[1.0, -0.5], 0.25, &mut rng).unwrap();
    let mut x = data.x.clone();
    x.column_mut(0).mapv_inplace(|v| 1e5 * v + 2e5);
    let first = x.column(0).to_owned();
    x.column_mut(1).assign(&first);

    let mut model = LogisticRegression::new(LogitConfig::default());
    assert!(matches!(
        model.fit(&x, &data.y, &[]),
        Err(ValidationError::Convergence {
            reason: ConvergenceReason::SingularHessian,
            ..
        })
    ));
}

#[test]
fn single_class_training_data_never_yields_a_model() {
    let x = array![[0.1, 1.0], [0.4, 0.2], [0.9, 0.5]];
    for label in [0.0, 1.0] {
        let y = Array1::from_elem(3, label);
        let mut model = LogisticRegression::new(LogitConfig::default());
        let err = model.fit(&x, &y, &[]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Convergence {
                reason: ConvergenceReason::SingleClass,
                ..
            }
        ));
        assert!(model.predict_proba(&x).is_err());
    }
}

#[test]
fn separated_data_fails_with_both_solvers() {
    let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
    let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    for solver in [Solver::default(), "gd".parse::<Solver>().unwrap()] {
        let mut model = LogisticRegression::new(LogitConfig::new(solver));
        assert!(matches!(
            model.fit(&x, &y, &[]),
            Err(ValidationError::Convergence {
                reason: ConvergenceReason::PerfectSeparation,
                ..
            })
        ));
    }
}

#[test]
fn mismatched_rows_are_rejected() {
    let mut model = LogisticRegression::new(LogitConfig::default());
    assert!(matches!(
        model.fit(&array![[1.0], [2.0]], &array![1.0], &[]),
        Err(ValidationError::LengthMismatch {
            predictors: 2,
            targets: 1
        })
    ));
}
