//! `fold-validator run`: load tables, cross-validate, write outputs.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;

use fold_validator::config::{load_config, Solver, ValidatorConfig};
use fold_validator::data_handling::Dataset;
use fold_validator::io::{
    read_combined, read_dataset, write_predictions_csv, write_report_json, TableReaderConfig,
};
use fold_validator::report::render_report;
use fold_validator::validator::{CrossValidationReport, FoldValidator};

/// Validator configuration plus the input and output locations of one run.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub config: ValidatorConfig,
    pub predictors: PathBuf,
    pub target: Option<PathBuf>,
    pub reader: TableReaderConfig,
    pub output: Option<PathBuf>,
    pub predictions: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

impl RunParams {
    /// Start from the JSON configuration (or defaults) and apply CLI overrides.
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let mut config = match matches.get_one::<PathBuf>("config") {
            Some(path) => load_config(path)?,
            None => {
                log::info!("No config provided; using defaults.");
                ValidatorConfig::default()
            }
        };

        if let Some(&n_folds) = matches.get_one::<usize>("folds") {
            config.n_folds = n_folds;
        }
        if let Some(&seed) = matches.get_one::<u64>("seed") {
            config.seed = Some(seed);
        }
        if let Some(&threshold) = matches.get_one::<f64>("threshold") {
            config.threshold = threshold;
        }
        if let Some(solver) = matches.get_one::<String>("solver") {
            config.model.solver = solver.parse::<Solver>().map_err(anyhow::Error::msg)?;
        }
        if matches.get_flag("parallel") {
            config.parallel = true;
        }
        if matches.get_flag("keep_going") {
            config.fail_fast = false;
        }
        if matches.get_flag("scale") {
            config.scale_features = true;
        }
        if matches.get_flag("no_intercept") {
            config.model.fit_intercept = false;
        }
        config.validate().context("Invalid validator configuration")?;

        let predictors = matches
            .get_one::<PathBuf>("predictors")
            .cloned()
            .context("--predictors is required")?;
        validate_table_path(&predictors)?;
        let target = matches.get_one::<PathBuf>("target").cloned();
        if let Some(target) = &target {
            validate_table_path(target)?;
        }

        let mut reader = TableReaderConfig::for_path(&predictors);
        if let Some(column) = matches.get_one::<String>("target_column") {
            reader.target_column = column.clone();
        }

        Ok(RunParams {
            config,
            predictors,
            target,
            reader,
            output: matches.get_one::<PathBuf>("output").cloned(),
            predictions: matches.get_one::<PathBuf>("predictions").cloned(),
            html: matches.get_one::<PathBuf>("html").cloned(),
        })
    }

    pub fn load_dataset(&self) -> Result<Dataset> {
        match &self.target {
            Some(target) => read_dataset(&self.predictors, target, &self.reader),
            None => read_combined(&self.predictors, &self.reader),
        }
    }
}

fn validate_table_path(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("csv") | Some("tsv") | Some("tab") | Some("txt") => {}
        _ => anyhow::bail!("Unsupported table extension: {}", path.display()),
    }
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(())
}

/// Plain-text per-fold and aggregate summary printed on stdout.
pub fn format_summary(report: &CrossValidationReport) -> String {
    let mut out = format!(
        "{:>4}  {:>6}  {:>5}  {:>8}  {:>8}  {:>6}\n",
        "fold", "train", "test", "accuracy", "log_loss", "auc"
    );
    for result in &report.folds {
        out.push_str(&format!(
            "{:>4}  {:>6}  {:>5}  {:>8.4}  {:>8.4}  {:>6}\n",
            result.fold,
            result.n_train,
            result.n_test,
            result.metrics.accuracy,
            result.metrics.log_loss,
            result
                .metrics
                .roc_auc
                .map_or_else(|| "n/a".to_string(), |auc| format!("{:.4}", auc))
        ));
    }
    for failure in &report.failures {
        out.push_str(&format!("{:>4}  failed: {}\n", failure.fold, failure.message));
    }
    match &report.summary {
        Some(summary) => out.push_str(&format!(
            "mean accuracy {:.4} (sd {:.4}), mean log-loss {:.4} (sd {:.4}), pooled accuracy {:.4}\n",
            summary.mean_accuracy,
            summary.std_accuracy,
            summary.mean_log_loss,
            summary.std_log_loss,
            summary.pooled.accuracy
        )),
        None => out.push_str("no fold succeeded\n"),
    }
    out
}

pub fn run(params: &RunParams) -> Result<CrossValidationReport> {
    let dataset = params.load_dataset()?;
    let validator = FoldValidator::new(params.config.clone());
    log::debug!("Validator configuration: {:?}", validator.config());
    let report = validator
        .cross_validate(&dataset)
        .context("Cross-validation failed")?;

    if let Some(path) = &params.output {
        write_report_json(path, &report)?;
        log::info!("Report written to {}", path.display());
    }
    if let Some(path) = &params.predictions {
        write_predictions_csv(path, &dataset, &report)?;
        log::info!("Out-of-fold predictions written to {}", path.display());
    }
    if let Some(path) = &params.html {
        render_report(&report, &dataset.y, path)?;
    }
    if !report.is_complete() {
        log::warn!("Folds {:?} failed", report.failed_folds());
    }
    Ok(report)
}
