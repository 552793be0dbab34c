//! Delimited-text readers and writers for predictor tables, targets and
//! cross-validation output.
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use ndarray::{Array1, Array2};

use crate::data_handling::Dataset;
use crate::validator::CrossValidationReport;

/// Configuration for reading predictor and target tables.
#[derive(Debug, Clone)]
pub struct TableReaderConfig {
    pub delimiter: u8,
    /// Column holding the 0/1 target.
    pub target_column: String,
    /// Optional list of predictor columns to load (in order).
    /// When `None`, every non-target, non-ignored column is a predictor.
    pub feature_columns: Option<Vec<String>>,
    /// Columns to skip when auto-selecting predictors.
    pub ignore_columns: Vec<String>,
}

impl Default for TableReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            target_column: "target".to_string(),
            feature_columns: None,
            ignore_columns: vec![
                "id".to_string(),
                "row".to_string(),
                "index".to_string(),
                "fold".to_string(),
            ],
        }
    }
}

impl TableReaderConfig {
    /// Default configuration with the delimiter guessed from the file
    /// extension (`.tsv`/`.tab` are tab separated).
    pub fn for_path<P: AsRef<Path>>(path: P) -> Self {
        let delimiter = match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") => b'\t',
            _ => b',',
        };
        Self {
            delimiter,
            ..Default::default()
        }
    }
}

struct Table {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

fn read_table<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("Failed to open table: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.as_ref().display()))?
        .clone();

    let records = reader
        .records()
        .enumerate()
        .map(|(row_idx, result)| {
            result.with_context(|| {
                format!("Failed to read row {} of {}", row_idx + 1, path.as_ref().display())
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if records.is_empty() {
        return Err(anyhow!("Table {} has no data rows", path.as_ref().display()));
    }

    Ok(Table { headers, records })
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
}

fn resolve_feature_indices(
    headers: &StringRecord,
    config: &TableReaderConfig,
    target_idx: Option<usize>,
) -> Result<Vec<usize>> {
    if let Some(names) = &config.feature_columns {
        return names
            .iter()
            .map(|name| {
                find_column(headers, name).ok_or_else(|| anyhow!("Missing feature column '{}'", name))
            })
            .collect();
    }

    let ignore: HashSet<String> = config
        .ignore_columns
        .iter()
        .map(|name| name.to_ascii_lowercase())
        .collect();

    Ok(headers
        .iter()
        .enumerate()
        .filter(|&(idx, header)| {
            Some(idx) != target_idx && !ignore.contains(&header.to_ascii_lowercase())
        })
        .map(|(idx, _)| idx)
        .collect())
}

fn parse_matrix(table: &Table, indices: &[usize]) -> Result<Array2<f64>> {
    let mut values = Vec::with_capacity(table.records.len() * indices.len());
    for (row_idx, record) in table.records.iter().enumerate() {
        for &idx in indices {
            let value = record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing value at row {}", row_idx + 1))?;
            let parsed = value.parse::<f64>().with_context(|| {
                format!(
                    "Invalid value '{}' in column '{}' at row {}",
                    value,
                    table.headers.get(idx).unwrap_or(""),
                    row_idx + 1
                )
            })?;
            values.push(parsed);
        }
    }
    Array2::from_shape_vec((table.records.len(), indices.len()), values)
        .context("Failed to build predictor matrix")
}

fn parse_target(table: &Table, idx: usize) -> Result<Array1<f64>> {
    table
        .records
        .iter()
        .enumerate()
        .map(|(row_idx, record)| {
            let value = record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing target value at row {}", row_idx + 1))?;
            value
                .parse::<f64>()
                .with_context(|| format!("Invalid target '{}' at row {}", value, row_idx + 1))
        })
        .collect()
}

fn column_names(headers: &StringRecord, indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .map(|&idx| headers.get(idx).unwrap_or("").to_string())
        .collect()
}

/// Read a predictor table and a target table aligned by row.
///
/// The target is taken from `config.target_column`, or from the only
/// non-ignored column when the target file has no column of that name.
pub fn read_dataset<P: AsRef<Path>, Q: AsRef<Path>>(
    predictors: P,
    target: Q,
    config: &TableReaderConfig,
) -> Result<Dataset> {
    let predictor_table = read_table(&predictors, config.delimiter)?;
    let stray_target = find_column(&predictor_table.headers, &config.target_column);
    let feature_indices = resolve_feature_indices(&predictor_table.headers, config, stray_target)?;
    if feature_indices.is_empty() {
        return Err(anyhow!(
            "No predictor columns detected in {}",
            predictors.as_ref().display()
        ));
    }
    let x = parse_matrix(&predictor_table, &feature_indices)?;

    let target_table = read_table(&target, config.delimiter)?;
    let target_idx = match find_column(&target_table.headers, &config.target_column) {
        Some(idx) => idx,
        None => {
            let candidates = resolve_feature_indices(
                &target_table.headers,
                &TableReaderConfig {
                    feature_columns: None,
                    ..config.clone()
                },
                None,
            )?;
            match candidates.as_slice() {
                [only] => *only,
                _ => {
                    return Err(anyhow!(
                        "Target table {} has no '{}' column and {} candidate columns",
                        target.as_ref().display(),
                        config.target_column,
                        candidates.len()
                    ))
                }
            }
        }
    };
    let y = parse_target(&target_table, target_idx)?;

    let dataset = Dataset::new(x, y, column_names(&predictor_table.headers, &feature_indices))
        .with_context(|| {
            format!(
                "Invalid data in {} / {}",
                predictors.as_ref().display(),
                target.as_ref().display()
            )
        })?;
    log::info!(
        "Loaded {} rows and {} predictors from {}",
        dataset.nrows(),
        dataset.ncols(),
        predictors.as_ref().display()
    );
    Ok(dataset)
}

/// Read one table holding both the predictors and the target column.
pub fn read_combined<P: AsRef<Path>>(path: P, config: &TableReaderConfig) -> Result<Dataset> {
    let table = read_table(&path, config.delimiter)?;
    let target_idx = find_column(&table.headers, &config.target_column)
        .ok_or_else(|| anyhow!("Missing target column '{}'", config.target_column))?;

    let feature_indices = resolve_feature_indices(&table.headers, config, Some(target_idx))?;
    if feature_indices.contains(&target_idx) {
        return Err(anyhow!(
            "Target column '{}' is also listed as a feature",
            config.target_column
        ));
    }
    if feature_indices.is_empty() {
        return Err(anyhow!("No predictor columns detected in {}", path.as_ref().display()));
    }

    let x = parse_matrix(&table, &feature_indices)?;
    let y = parse_target(&table, target_idx)?;
    let dataset = Dataset::new(x, y, column_names(&table.headers, &feature_indices))
        .with_context(|| format!("Invalid data in {}", path.as_ref().display()))?;
    log::info!(
        "Loaded {} rows and {} predictors from {}",
        dataset.nrows(),
        dataset.ncols(),
        path.as_ref().display()
    );
    Ok(dataset)
}

/// Write one line per input row: `row,fold,target,probability,predicted`.
///
/// Rows whose fold failed keep empty probability and prediction cells.
pub fn write_predictions_csv<P: AsRef<Path>>(
    path: P,
    dataset: &Dataset,
    report: &CrossValidationReport,
) -> Result<()> {
    if dataset.nrows() != report.n_rows {
        return Err(anyhow!(
            "Report covers {} rows but dataset has {}",
            report.n_rows,
            dataset.nrows()
        ));
    }

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;
    writer.write_record(["row", "fold", "target", "probability", "predicted"])?;

    let threshold = report.config.threshold;
    for i in 0..dataset.nrows() {
        let p = report.out_of_fold[i];
        let (probability, predicted) = if p.is_finite() {
            (p.to_string(), u8::from(p >= threshold).to_string())
        } else {
            (String::new(), String::new())
        };
        writer.write_record([
            dataset.row_id[i].to_string(),
            report.assignments[i].to_string(),
            dataset.y[i].to_string(),
            probability,
            predicted,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize the full report as pretty-printed JSON.
pub fn write_report_json<P: AsRef<Path>>(path: P, report: &CrossValidationReport) -> Result<()> {
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write report to {}", path.as_ref().display()))?;
    Ok(())
}
