use fold_validator::config::{Solver, ValidatorConfig};
use fold_validator::data_handling::simulate_logistic;
use fold_validator::folds::rng_from_seed;
use fold_validator::report::render_report;
use fold_validator::validator::FoldValidator;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // 500 rows from logit(p) = 0.3 + 1.5 * x1 - 2.0 * x2
    let mut rng = rng_from_seed(Some(2024));
    let data = simulate_logistic(500, &[1.5, -2.0], 0.3, &mut rng)?;

    let mut config = ValidatorConfig::new(5, Some(7));
    config.parallel = true;

    let report = FoldValidator::new(config.clone()).cross_validate(&data)?;
    for result in &report.folds {
        let fit = result.fit.as_ref();
        println!(
            "fold {}: n_test={} accuracy={:.3} log_loss={:.3} params={:?}",
            result.fold,
            result.n_test,
            result.metrics.accuracy,
            result.metrics.log_loss,
            fit.map(|f| f.params().to_vec())
        );
    }
    if let Some(summary) = &report.summary {
        println!(
            "Newton: mean accuracy {:.3} +/- {:.3}",
            summary.mean_accuracy, summary.std_accuracy
        );
    }

    // Same folds, gradient descent
    config.model.solver = Solver::GradientDescent {
        learning_rate: 0.5,
        max_iter: 20_000,
    };
    let gd_report =
        FoldValidator::new(config).cross_validate_with_folds(&data, &report.assignments)?;
    if let Some(summary) = &gd_report.summary {
        println!(
            "Gradient descent: mean accuracy {:.3} +/- {:.3}",
            summary.mean_accuracy, summary.std_accuracy
        );
    }

    render_report(&report, &data.y, "synthetic_cross_validation.html")?;
    println!("Report saved to synthetic_cross_validation.html");

    Ok(())
}
