use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::io::Write;
use std::path::PathBuf;

use fold_validator::config::ValidatorConfig;

mod cli;

use cli::run::{format_summary, run, RunParams};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(
            env_logger::Env::default().filter_or("FOLD_VALIDATOR_LOG", "error,fold_validator=info"),
        )
        .init();

    let matches = Command::new("fold-validator")
        .version(clap::crate_version!())
        .about("V-fold cross-validation of binary logistic regression")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Cross-validate a logistic regression on a predictor table")
                .arg(
                    Arg::new("config")
                        .help("Path to validator JSON configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("predictors")
                        .short('p')
                        .long("predictors")
                        .help(
                            "Predictor table (*.csv or *.tsv). Also holds the target column \
                             unless --target is given.",
                        )
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("target")
                        .short('t')
                        .long("target")
                        .help("Target table aligned by row with the predictor table")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("target_column")
                        .long("target-column")
                        .help("Name of the 0/1 target column. Defaults to 'target'.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("folds")
                        .short('k')
                        .long("folds")
                        .help("Number of folds. Overrides the configuration file.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("seed")
                        .short('s')
                        .long("seed")
                        .help("Seed for the fold assignment. Overrides the configuration file.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("threshold")
                        .long("threshold")
                        .help("Probability cut-off for positive predictions.")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("solver")
                        .long("solver")
                        .help("Override the solver from the JSON config.")
                        .value_parser(["newton", "gradient_descent"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("parallel")
                        .long("parallel")
                        .help("Process folds in parallel.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("keep_going")
                        .long("keep-going")
                        .help("Collect failing folds instead of stopping at the first one. \
                             Exits with status 2 when any fold failed.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("scale")
                        .long("scale")
                        .help("Standardize predictors with training-fold statistics.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no_intercept")
                        .long("no-intercept")
                        .help("Fit the model without a constant term.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Path to write the JSON report.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("predictions")
                        .long("predictions")
                        .help("Path to write out-of-fold predictions (CSV).")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help("Path to write the HTML report.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("default-config").about("Print the default configuration as JSON"),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("run", sub_m)) => handle_run(sub_m),
        Some(("default-config", _)) => {
            println!("{}", serde_json::to_string_pretty(&ValidatorConfig::default())?);
            Ok(())
        }
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_run(matches: &ArgMatches) -> Result<()> {
    let params = RunParams::from_arguments(matches)?;
    log::info!(
        "[fold-validator] Cross-validating {:?} with {} folds",
        params.predictors,
        params.config.n_folds
    );

    match run(&params) {
        Ok(report) => {
            print!("{}", format_summary(&report));
            std::io::stdout().flush()?;
            if !report.is_complete() {
                log::error!(
                    "{} of {} folds failed",
                    report.failures.len(),
                    report.n_folds()
                );
                std::process::exit(2)
            }
            Ok(())
        }
        Err(e) => {
            log::error!("{:#}", e);
            std::process::exit(1)
        }
    }
}
