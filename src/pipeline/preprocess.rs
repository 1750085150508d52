//! Derived columns: z-score standardization and dummy indicators
//!
//! Both operations append columns and leave the source columns untouched.
//! Running them again replaces the derived columns with identical values; a
//! derived name already holding different data is a schema error.

use polars::prelude::*;
use serde::Serialize;

use super::columns::{complete_numeric_values, require_column, string_values};
use crate::error::{PipelineError, Result, Stage};

/// Suffix appended to standardized columns
pub const SCALED_SUFFIX: &str = "_scaled";

/// Name of the standardized column derived from `source`
pub fn scaled_name(source: &str) -> String {
    format!("{}{}", source, SCALED_SUFFIX)
}

/// Name of the indicator column for `level` of `source`
pub fn dummy_name(source: &str, level: &str) -> String {
    format!("{}_{}", source, level)
}

/// Population statistics used to standardize one column
#[derive(Debug, Clone, Serialize)]
pub struct ScalingParams {
    pub column: String,
    pub mean: f64,
    pub std: f64,
}

/// Append `<column>_scaled` for each input column.
pub fn standardize(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    let (out, _) = standardize_with_params(df, columns)?;
    Ok(out)
}

/// Like [`standardize`], also returning the statistics used per column.
pub fn standardize_with_params(
    df: &DataFrame,
    columns: &[String],
) -> Result<(DataFrame, Vec<ScalingParams>)> {
    let mut out = df.clone();
    let mut params = Vec::with_capacity(columns.len());

    for name in columns {
        let values = complete_numeric_values(df, name, Stage::Preprocessor)?;
        if values.is_empty() {
            return Err(PipelineError::data(
                Stage::Preprocessor,
                name.as_str(),
                "cannot standardize an empty column",
            ));
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        if std == 0.0 || !std.is_finite() {
            return Err(PipelineError::data(
                Stage::Preprocessor,
                name.as_str(),
                "zero variance; a constant column cannot be standardized",
            ));
        }

        let scaled: Vec<f64> = values.iter().map(|v| (v - mean) / std).collect();
        append_derived(&mut out, Column::new(scaled_name(name).into(), scaled))?;
        params.push(ScalingParams {
            column: name.clone(),
            mean,
            std,
        });
    }

    Ok((out, params))
}

/// Append one indicator column per observed level of `column`.
///
/// Levels are the distinct values in sorted order.
pub fn add_dummies(df: &DataFrame, column: &str) -> Result<DataFrame> {
    let values = categorical_values(df, column)?;
    let mut levels: Vec<String> = values.clone();
    levels.sort();
    levels.dedup();
    build_dummies(df, column, &values, &levels)
}

/// Append one indicator column per given level. Every value must be one of
/// `levels`.
pub fn add_dummies_with_levels(df: &DataFrame, column: &str, levels: &[String]) -> Result<DataFrame> {
    let mut unique = levels.to_vec();
    unique.sort();
    unique.dedup();
    if unique.len() != levels.len() {
        return Err(PipelineError::configuration(
            Stage::Preprocessor,
            column,
            "duplicate level in the explicit level list",
        ));
    }
    if levels.is_empty() {
        return Err(PipelineError::configuration(
            Stage::Preprocessor,
            column,
            "at least one level is required",
        ));
    }

    let values = categorical_values(df, column)?;
    if let Some(unknown) = values.iter().find(|v| !levels.contains(v)) {
        return Err(PipelineError::data(
            Stage::Preprocessor,
            column,
            format!("value '{}' is not one of the levels {:?}", unknown, levels),
        ));
    }

    build_dummies(df, column, &values, levels)
}

fn categorical_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    require_column(df, column, Stage::Preprocessor)?;
    let values = string_values(df, column, Stage::Preprocessor)?;
    let missing = values.iter().filter(|v| v.is_none()).count();
    if missing > 0 {
        return Err(PipelineError::configuration(
            Stage::Preprocessor,
            column,
            format!("{} missing value(s) in categorical column", missing),
        ));
    }
    if values.is_empty() {
        return Err(PipelineError::data(
            Stage::Preprocessor,
            column,
            "cannot encode an empty column",
        ));
    }
    Ok(values.into_iter().flatten().collect())
}

fn build_dummies(
    df: &DataFrame,
    column: &str,
    values: &[String],
    levels: &[String],
) -> Result<DataFrame> {
    let mut out = df.clone();
    for level in levels {
        let indicator: Vec<i32> = values.iter().map(|v| i32::from(v == level)).collect();
        append_derived(&mut out, Column::new(dummy_name(column, level).into(), indicator))?;
    }
    Ok(out)
}

/// Add `derived`, refusing to replace a column that holds other data.
fn append_derived(out: &mut DataFrame, derived: Column) -> Result<()> {
    if let Ok(existing) = out.column(derived.name()) {
        let identical = existing.dtype() == derived.dtype()
            && existing
                .as_materialized_series()
                .equals(derived.as_materialized_series());
        if !identical {
            return Err(PipelineError::schema(
                Stage::Preprocessor,
                derived.name().as_str(),
                "derived column would overwrite an existing column",
            ));
        }
    }
    out.with_column(derived)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_conventions() {
        assert_eq!(scaled_name("petal_length"), "petal_length_scaled");
        assert_eq!(dummy_name("species", "setosa"), "species_setosa");
    }

    #[test]
    fn test_standardize_params_use_population_std() {
        let df = df! { "x" => [1.0f64, 2.0, 3.0, 4.0] }.unwrap();
        let (_, params) = standardize_with_params(&df, &["x".to_string()]).unwrap();
        assert!((params[0].mean - 2.5).abs() < 1e-12);
        assert!((params[0].std - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_standardize_is_idempotent() {
        let df = df! { "x" => [1.0f64, 5.0, 9.0] }.unwrap();
        let cols = vec!["x".to_string()];
        let once = standardize(&df, &cols).unwrap();
        let twice = standardize(&once, &cols).unwrap();
        assert_eq!(once.width(), twice.width());
        assert!(once.equals(&twice));
    }

    #[test]
    fn test_dummy_name_collision_keeps_original() {
        let df = df! {
            "a" => ["x", "y", "x"],
            "a_x" => [10.0f64, 20.0, 30.0],
        }
        .unwrap();
        let err = add_dummies(&df, "a").unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("a_x"));
    }

    #[test]
    fn test_scaled_name_collision_keeps_original() {
        let df = df! {
            "x" => [1.0f64, 2.0, 3.0],
            "x_scaled" => [7.0f64, 7.0, 7.0],
        }
        .unwrap();
        let err = standardize(&df, &["x".to_string()]).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_dummies_are_idempotent() {
        let df = df! { "s" => ["a", "b", "a"] }.unwrap();
        let once = add_dummies(&df, "s").unwrap();
        let twice = add_dummies(&once, "s").unwrap();
        assert_eq!(twice.width(), 3);
        assert!(once.equals(&twice));
    }

    #[test]
    fn test_dummies_with_unknown_level() {
        let df = df! { "s" => ["a", "b", "c"] }.unwrap();
        let levels = vec!["a".to_string(), "b".to_string()];
        assert!(add_dummies_with_levels(&df, "s", &levels).unwrap_err().is_data());
    }

    #[test]
    fn test_dummies_with_duplicate_levels() {
        let df = df! { "s" => ["a", "b"] }.unwrap();
        let levels = vec!["a".to_string(), "a".to_string()];
        assert!(add_dummies_with_levels(&df, "s", &levels)
            .unwrap_err()
            .is_configuration());
    }
}
