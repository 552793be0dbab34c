use std::env;

use fold_validator::config::{load_config, ValidatorConfig};
use fold_validator::io::{read_combined, write_predictions_csv, TableReaderConfig};
use fold_validator::validator::FoldValidator;

/// Usage: csv_cross_validation <data.csv> [config.json]
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_path = args
        .get(1)
        .ok_or_else(|| anyhow::anyhow!("usage: csv_cross_validation <data.csv> [config.json]"))?;
    let mut config = match args.get(2) {
        Some(path) => load_config(path)?,
        None => ValidatorConfig::default(),
    };
    // Report every fold, even when some cannot be fitted
    config.fail_fast = false;

    let data = read_combined(data_path, &TableReaderConfig::for_path(data_path))?;
    let report = FoldValidator::new(config).cross_validate(&data)?;

    println!("Fold sizes: {:?}", report.fold_sizes);
    for failure in &report.failures {
        println!("fold {} failed: {}", failure.fold, failure.message);
    }
    if let Some(summary) = &report.summary {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }

    write_predictions_csv("out_of_fold.csv", &data, &report)?;
    println!("Out-of-fold predictions saved to out_of_fold.csv");
    Ok(())
}
