//! CLI binary smoke tests using assert_cmd.
//!
//! These tests exercise the compiled `fold-validator` binary to verify that
//! argument parsing, configuration overrides, output files and error handling
//! work end-to-end.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use fold_validator::data_handling::simulate_logistic;
use fold_validator::folds::rng_from_seed;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("fold-validator").unwrap()
}

fn write_simulated_csv(dir: &Path) -> PathBuf {
    let mut rng = rng_from_seed(Some(31));
    let data = simulate_logistic(150, &[2.5, -3.0], 0.2, &mut rng).unwrap();
    let mut text = String::from("x1,x2,target\n");
    for i in 0..data.nrows() {
        text.push_str(&format!("{},{},{}\n", data.x[(i, 0)], data.x[(i, 1)], data.y[i]));
    }
    let path = dir.join("data.csv");
    fs::write(&path, text).unwrap();
    path
}

fn write_separable_csv(dir: &Path) -> PathBuf {
    let mut text = String::from("x,target\n");
    for i in 1..=20 {
        text.push_str(&format!("{},{}\n", i, u8::from(i > 10)));
    }
    let path = dir.join("separable.csv");
    fs::write(&path, text).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("default-config"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fold-validator"));
}

#[test]
fn default_config_prints_json() {
    cmd()
        .arg("default-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"n_folds\": 5"))
        .stdout(predicate::str::contains("\"fail_fast\": true"));
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_simulated_csv(dir.path());
    let report = dir.path().join("report.json");
    let predictions = dir.path().join("oof.csv");
    let html = dir.path().join("report.html");

    cmd()
        .arg("run")
        .arg("--predictors")
        .arg(&data)
        .args(["--folds", "3", "--seed", "8", "--parallel"])
        .arg("--output")
        .arg(&report)
        .arg("--predictions")
        .arg(&predictions)
        .arg("--html")
        .arg(&html)
        .assert()
        .success()
        .stdout(predicate::str::contains("mean accuracy"));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["config"]["n_folds"], 3);
    assert_eq!(value["config"]["seed"], 8);
    assert_eq!(value["folds"].as_array().unwrap().len(), 3);
    assert_eq!(fs::read_to_string(&predictions).unwrap().lines().count(), 151);
    assert!(html.exists());
}

#[test]
fn run_with_separate_target_file_and_config() {
    let dir = tempfile::tempdir().unwrap();
    let preds = dir.path().join("x.csv");
    let target = dir.path().join("y.csv");
    let config = dir.path().join("config.json");

    let mut rng = rng_from_seed(Some(4));
    let data = simulate_logistic(90, &[2.0], 0.0, &mut rng).unwrap();
    let mut x_text = String::from("dose\n");
    let mut y_text = String::from("response\n");
    for i in 0..data.nrows() {
        x_text.push_str(&format!("{}\n", data.x[(i, 0)]));
        y_text.push_str(&format!("{}\n", data.y[i]));
    }
    fs::write(&preds, x_text).unwrap();
    fs::write(&target, y_text).unwrap();
    fs::write(&config, r#"{"n_folds": 2, "seed": 3}"#).unwrap();

    cmd()
        .arg("run")
        .arg(&config)
        .arg("--predictors")
        .arg(&preds)
        .arg("--target")
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("fold"));
}

#[test]
fn run_rejects_single_fold() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_simulated_csv(dir.path());
    cmd()
        .arg("run")
        .arg("--predictors")
        .arg(&data)
        .args(["--folds", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("n_folds must be at least 2"));
}

#[test]
fn run_missing_file_errors() {
    cmd()
        .args(["run", "--predictors", "/nonexistent/data.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn failing_fold_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_separable_csv(dir.path());
    cmd()
        .arg("run")
        .arg("--predictors")
        .arg(&data)
        .args(["--folds", "2", "--seed", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fold 1 failed"));
}

#[test]
fn keep_going_collects_failed_folds() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_separable_csv(dir.path());
    cmd()
        .arg("run")
        .arg("--predictors")
        .arg(&data)
        .args(["--folds", "2", "--seed", "1", "--keep-going"])
        .assert()
        .failure()
        .code(2)
        .stdout(predicate::str::contains("failed"))
        .stdout(predicate::str::contains("no fold succeeded"));
}
