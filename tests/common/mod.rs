//! Shared test utilities and fixture generators

use glmstep::pipeline::columns::numeric_column_names;
use glmstep::pipeline::{add_dummies, reference_dataset, scaled_name, standardize};
use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// The embedded iris table
pub fn iris() -> DataFrame {
    reference_dataset().unwrap()
}

/// Iris with `<measurement>_scaled` and `species_<level>` columns appended
pub fn prepared_iris() -> DataFrame {
    let df = iris();
    let numeric = numeric_column_names(&df);
    let df = standardize(&df, &numeric).unwrap();
    add_dummies(&df, "species").unwrap()
}

/// Names of the four standardized iris measurements
pub fn iris_scaled_predictors() -> Vec<String> {
    ["sepal_length", "sepal_width", "petal_length", "petal_width"]
        .iter()
        .map(|c| scaled_name(c))
        .collect()
}

/// Create a small overlapping classification problem
///
/// This DataFrame includes:
/// - `target`: Binary target column (0/1), classes overlap on `signal`
/// - `signal`: Informative predictor
/// - `noise`: Uninformative predictor
/// - `label`: String column with two levels
pub fn create_test_dataframe() -> DataFrame {
    df! {
        "target" => [0i32, 0, 0, 1, 0, 0, 1, 0, 1, 1,
                     0, 1, 0, 1, 1, 0, 1, 1, 1, 1],
        "signal" => [1.0f64, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 5.5,
                     6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0, 9.5, 10.0, 10.5],
        "noise" => [0.3f64, 0.9, 0.1, 0.7, 0.5, 0.2, 0.8, 0.4, 0.6, 0.0,
                    0.5, 0.1, 0.9, 0.3, 0.7, 0.6, 0.2, 0.8, 0.4, 1.0],
        "label" => ["no", "no", "no", "yes", "no", "no", "yes", "no", "yes", "yes",
                    "no", "yes", "no", "yes", "yes", "no", "yes", "yes", "yes", "yes"],
    }
    .unwrap()
}

/// Create a DataFrame with specific missing value patterns
pub fn create_missing_test_dataframe() -> DataFrame {
    df! {
        "complete" => [1.0f64, 2.0, 3.0, 4.0, 5.0],
        "gappy" => [Some(10.0f64), None, Some(30.0), None, Some(50.0)],
        "leading_gap" => [None, Some(2.0f64), Some(3.0), Some(4.0), Some(5.0)],
        "label" => ["a", "b", "a", "b", "a"],
    }
    .unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Float64 values of a column, panicking on nulls
pub fn f64_values(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}
