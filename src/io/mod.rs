//! IO utilities for loading predictor/target tables and writing results.

pub mod table;

pub use table::{
    read_combined, read_dataset, write_predictions_csv, write_report_json, TableReaderConfig,
};
