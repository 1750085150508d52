//! Dataset loader for the embedded reference table and CSV/Parquet files

use std::io::Cursor;
use std::path::Path;

use polars::prelude::*;

use crate::error::{PipelineError, Result, Stage};

/// The 150-row iris table: four measurements in cm and the species label.
const REFERENCE_CSV: &str = include_str!("../../data/iris.csv");

/// Name of the categorical label column in the reference dataset
pub const REFERENCE_LABEL: &str = "species";

/// Numeric measurement columns of the reference dataset
pub const REFERENCE_MEASUREMENTS: [&str; 4] =
    ["sepal_length", "sepal_width", "petal_length", "petal_width"];

/// Materialize the reference dataset.
pub fn reference_dataset() -> Result<DataFrame> {
    let df = CsvReader::new(Cursor::new(REFERENCE_CSV.as_bytes())).finish()?;
    Ok(df)
}

/// Load a dataset from a file (CSV or Parquet based on extension)
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    // 0 means full table scan
    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(schema_length)
            .finish()?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())?,
        _ => {
            return Err(PipelineError::configuration(
                Stage::Loader,
                path.display().to_string(),
                format!(
                    "unsupported file format '{}'. Supported formats: csv, parquet",
                    extension
                ),
            ))
        }
    };

    let df = lf.collect()?;
    if df.height() == 0 {
        return Err(PipelineError::data(
            Stage::Loader,
            path.display().to_string(),
            "dataset has no rows",
        ));
    }

    Ok(df)
}

/// Load from `path` when given, otherwise fall back to the reference dataset.
pub fn load_or_reference(path: Option<&Path>, infer_schema_length: usize) -> Result<DataFrame> {
    match path {
        Some(p) => load_dataset(p, infer_schema_length),
        None => reference_dataset(),
    }
}

/// Get column names in frame order
pub fn get_column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Estimated in-memory size of the frame in megabytes
pub fn estimated_memory_mb(df: &DataFrame) -> f64 {
    df.estimated_size() as f64 / (1024.0 * 1024.0)
}
