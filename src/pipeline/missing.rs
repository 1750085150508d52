//! Missing value analysis and opt-in imputation
//!
//! The pipeline refuses to run past exploration while any column has
//! missing values. Imputation is only ever applied when the caller asks
//! for it with an explicit [`ImputeStrategy`].

use polars::prelude::*;
use serde::Serialize;

use super::columns::{numeric_column_names, numeric_values, require_column};
use crate::error::{PipelineError, Result, Stage};

/// Count missing values per column, in frame order.
///
/// NaN in a float column counts as missing.
pub fn count_missing(df: &DataFrame) -> Result<Vec<(String, usize)>> {
    let mut counts = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let name = column.name().to_string();
        let nan_count = if column.dtype().is_float() {
            let float_col = column.cast(&DataType::Float64)?;
            float_col
                .f64()?
                .iter()
                .filter(|v| v.is_some_and(|x| x.is_nan()))
                .count()
        } else {
            0
        };
        counts.push((name, column.null_count() + nan_count));
    }

    Ok(counts)
}

/// Columns with at least one missing value
pub fn columns_with_missing(counts: &[(String, usize)]) -> Vec<String> {
    counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Fail with a configuration error if any column has missing values.
pub fn ensure_no_missing(counts: &[(String, usize)]) -> Result<()> {
    let offenders: Vec<String> = counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, count)| format!("{} ({})", name, count))
        .collect();

    if offenders.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::configuration(
            Stage::Explorer,
            offenders.join(", "),
            "missing values present; choose an imputation strategy or clean the input",
        ))
    }
}

/// How to fill missing values in a numeric column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ImputeStrategy {
    /// Replace with the column mean of the observed values
    Mean,
    /// Carry the previous observed value forward
    ForwardFill,
    /// Carry the next observed value backward
    BackwardFill,
    /// Copy the value of the closest complete row (Euclidean distance over
    /// the other complete numeric columns)
    NearestNeighbor,
}

impl std::fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ImputeStrategy::Mean => "mean",
            ImputeStrategy::ForwardFill => "forward-fill",
            ImputeStrategy::BackwardFill => "backward-fill",
            ImputeStrategy::NearestNeighbor => "nearest-neighbor",
        };
        f.write_str(name)
    }
}

/// Return a copy of `df` with the missing values of `column` filled.
///
/// The filled column keeps its name and is stored as Float64. Leading
/// gaps under forward fill and trailing gaps under backward fill have no
/// donor and stay missing.
pub fn impute_missing(df: &DataFrame, column: &str, strategy: ImputeStrategy) -> Result<DataFrame> {
    let values = numeric_values(df, column, Stage::Explorer)?;

    let filled = match strategy {
        ImputeStrategy::Mean => fill_mean(&values, column)?,
        ImputeStrategy::ForwardFill => fill_forward(&values),
        ImputeStrategy::BackwardFill => {
            let mut reversed: Vec<Option<f64>> = values.iter().rev().copied().collect();
            reversed = fill_forward(&reversed);
            reversed.reverse();
            reversed
        }
        ImputeStrategy::NearestNeighbor => fill_nearest_neighbor(df, column, &values)?,
    };

    let mut out = df.clone();
    out.with_column(Column::new(column.into(), filled))?;
    Ok(out)
}

/// Impute every column that has missing values with the same strategy.
pub fn impute_all(df: &DataFrame, strategy: ImputeStrategy) -> Result<DataFrame> {
    let counts = count_missing(df)?;
    let mut out = df.clone();
    for name in columns_with_missing(&counts) {
        let column = require_column(&out, &name, Stage::Explorer)?;
        if !column.dtype().is_primitive_numeric() {
            return Err(PipelineError::schema(
                Stage::Explorer,
                name,
                "only numeric columns can be imputed",
            ));
        }
        out = impute_missing(&out, &name, strategy)?;
    }
    Ok(out)
}

fn fill_mean(values: &[Option<f64>], column: &str) -> Result<Vec<Option<f64>>> {
    let observed: Vec<f64> = values.iter().flatten().copied().collect();
    if observed.is_empty() {
        return Err(PipelineError::data(
            Stage::Explorer,
            column,
            "cannot impute a column with no observed values",
        ));
    }
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    Ok(values.iter().map(|v| Some(v.unwrap_or(mean))).collect())
}

fn fill_forward(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

fn fill_nearest_neighbor(
    df: &DataFrame,
    column: &str,
    values: &[Option<f64>],
) -> Result<Vec<Option<f64>>> {
    // Distance features: every other numeric column without gaps
    let mut features: Vec<Vec<f64>> = Vec::new();
    for name in numeric_column_names(df) {
        if name == column {
            continue;
        }
        let col_values = numeric_values(df, &name, Stage::Explorer)?;
        if col_values.iter().all(|v| v.is_some()) {
            features.push(col_values.into_iter().flatten().collect());
        }
    }

    if features.is_empty() {
        return Err(PipelineError::data(
            Stage::Explorer,
            column,
            "nearest-neighbor imputation needs at least one other complete numeric column",
        ));
    }

    let donors: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
    if donors.is_empty() {
        return Err(PipelineError::data(
            Stage::Explorer,
            column,
            "cannot impute a column with no observed values",
        ));
    }

    let distance = |a: usize, b: usize| -> f64 {
        features
            .iter()
            .map(|f| (f[a] - f[b]).powi(2))
            .sum::<f64>()
    };

    let filled = values
        .iter()
        .enumerate()
        .map(|(row, v)| {
            v.or_else(|| {
                donors
                    .iter()
                    .min_by(|&&a, &&b| {
                        distance(row, a)
                            .partial_cmp(&distance(row, b))
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .and_then(|&donor| values[donor])
            })
        })
        .collect();

    Ok(filled)
}
