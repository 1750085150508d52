//! Column access helpers shared by every stage

use polars::prelude::*;

use crate::error::{PipelineError, Result, Stage};

/// Look up a column, reporting a schema error for `stage` if it is absent.
pub fn require_column<'a>(df: &'a DataFrame, name: &str, stage: Stage) -> Result<&'a Column> {
    df.column(name).map_err(|_| {
        let available: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        PipelineError::schema(
            stage,
            name,
            format!("column not found. Available columns: {:?}", available),
        )
    })
}

pub fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_primitive_numeric()
}

pub fn is_categorical(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _) | DataType::Enum(_, _))
}

/// Names of the numeric columns, in frame order
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

/// Names of the string/categorical columns, in frame order
pub fn categorical_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_categorical(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

/// Read a numeric column as `Option<f64>` values. NaN is reported as `None`.
pub fn numeric_values(df: &DataFrame, name: &str, stage: Stage) -> Result<Vec<Option<f64>>> {
    let column = require_column(df, name, stage)?;
    if !is_numeric(column.dtype()) {
        return Err(PipelineError::schema(
            stage,
            name,
            format!("expected a numeric column, found {}", column.dtype()),
        ));
    }

    let float_col = column.cast(&DataType::Float64)?;
    let values = float_col
        .f64()?
        .iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Read a numeric column that must not contain missing values.
pub fn complete_numeric_values(df: &DataFrame, name: &str, stage: Stage) -> Result<Vec<f64>> {
    let values = numeric_values(df, name, stage)?;
    let missing = values.iter().filter(|v| v.is_none()).count();
    if missing > 0 {
        return Err(PipelineError::configuration(
            stage,
            name,
            format!("{} missing value(s); impute or drop them before this stage", missing),
        ));
    }
    Ok(values.into_iter().flatten().collect())
}

/// Read any column as optional strings (numbers are formatted with `{}`).
pub fn string_values(df: &DataFrame, name: &str, stage: Stage) -> Result<Vec<Option<String>>> {
    let column = require_column(df, name, stage)?;

    let values = if is_numeric(column.dtype()) {
        let float_col = column.cast(&DataType::Float64)?;
        float_col
            .f64()?
            .iter()
            .map(|v| v.filter(|x| !x.is_nan()).map(|x| format!("{}", x)))
            .collect()
    } else {
        let str_col = column.cast(&DataType::String)?;
        str_col
            .str()?
            .iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect()
    };

    Ok(values)
}
