//! Binary target detection and 0/1 encoding
//!
//! A target is usable when it holds exactly two distinct values. Numeric
//! 0/1 columns are taken as-is; any other pair is mapped by sorted order,
//! the first value becoming 0 and the second 1.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::columns::{is_numeric, numeric_values, require_column, string_values};
use crate::error::{PipelineError, Result, Stage};

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Which raw values the target encoding maps to 1 and 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetMapping {
    /// Value that maps to 1 (event)
    pub event_value: String,
    /// Value that maps to 0 (non-event)
    pub non_event_value: String,
}

/// A target column encoded as 0.0 / 1.0
#[derive(Debug, Clone)]
pub struct BinaryTarget {
    pub values: Vec<f64>,
    pub mapping: TargetMapping,
}

impl BinaryTarget {
    pub fn events(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1.0).count()
    }

    pub fn as_labels(&self) -> Vec<u8> {
        self.values.iter().map(|&v| v as u8).collect()
    }
}

/// Encode `target` as a binary 0/1 vector.
pub fn binary_target(df: &DataFrame, target: &str) -> Result<BinaryTarget> {
    let column = require_column(df, target, Stage::Modeler)?;

    if column.len() == 0 {
        return Err(PipelineError::data(Stage::Modeler, target, "target column is empty"));
    }
    if column.null_count() > 0 {
        return Err(PipelineError::configuration(
            Stage::Modeler,
            target,
            format!("{} missing value(s) in target column", column.null_count()),
        ));
    }

    if is_numeric(column.dtype()) {
        let values = numeric_values(df, target, Stage::Modeler)?;
        if values.iter().any(|v| v.is_none()) {
            return Err(PipelineError::configuration(
                Stage::Modeler,
                target,
                "NaN in target column",
            ));
        }
        let values: Vec<f64> = values.into_iter().flatten().collect();
        let is_zero_one = values
            .iter()
            .all(|&v| v.abs() < TOLERANCE || (v - 1.0).abs() < TOLERANCE);
        let distinct = distinct_count(&values);
        if distinct != 2 {
            return Err(not_binary(target, distinct));
        }
        if is_zero_one {
            return Ok(BinaryTarget {
                values: values.iter().map(|&v| v.round()).collect(),
                mapping: TargetMapping {
                    event_value: "1".to_string(),
                    non_event_value: "0".to_string(),
                },
            });
        }

        // Numeric pair: the smaller value is the non-event
        let low = values.iter().copied().fold(f64::INFINITY, f64::min);
        let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        return Ok(BinaryTarget {
            values: values
                .iter()
                .map(|&v| if (v - high).abs() < TOLERANCE { 1.0 } else { 0.0 })
                .collect(),
            mapping: TargetMapping {
                event_value: format!("{}", high),
                non_event_value: format!("{}", low),
            },
        });
    }

    let raw: Vec<String> = string_values(df, target, Stage::Modeler)?
        .into_iter()
        .flatten()
        .collect();
    let mut levels = raw.clone();
    levels.sort();
    levels.dedup();

    if levels.len() != 2 {
        return Err(not_binary(target, levels.len()));
    }

    let mapping = TargetMapping {
        non_event_value: levels[0].clone(),
        event_value: levels[1].clone(),
    };
    let values = raw
        .iter()
        .map(|v| if *v == mapping.event_value { 1.0 } else { 0.0 })
        .collect();

    Ok(BinaryTarget { values, mapping })
}

fn not_binary(target: &str, distinct: usize) -> PipelineError {
    PipelineError::data(
        Stage::Modeler,
        target,
        format!("target must have exactly two distinct values, found {}", distinct),
    )
}

fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted.dedup_by(|a, b| (*a - *b).abs() < TOLERANCE);
    sorted.len()
}
