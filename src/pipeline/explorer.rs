//! Exploratory analysis: summary statistics, category counts, histograms

use polars::prelude::*;
use serde::Serialize;

use super::columns::{categorical_column_names, numeric_column_names, numeric_values, string_values};
use super::missing::count_missing;
use crate::error::{PipelineError, Result, Stage};

/// Default histogram bin count
pub const DEFAULT_BINS: usize = 10;

/// Describe-style summary of one numeric column
#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub column: String,
    /// Non-missing values
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Level counts of one categorical column, sorted by level
#[derive(Debug, Clone, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub levels: Vec<(String, usize)>,
}

impl CategoricalSummary {
    pub fn level_names(&self) -> Vec<String> {
        self.levels.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Equal-width histogram over the observed range
#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub column: String,
    /// `bins + 1` ascending edges; the last bin is closed on the right
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Everything the explorer learns about a dataset
#[derive(Debug, Clone, Serialize)]
pub struct ExplorationReport {
    pub rows: usize,
    pub columns: usize,
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoricalSummary>,
    pub histograms: Vec<Histogram>,
    pub missing: Vec<(String, usize)>,
}

impl ExplorationReport {
    pub fn total_missing(&self) -> usize {
        self.missing.iter().map(|(_, count)| count).sum()
    }
}

/// Run the whole exploration step. The frame is only read.
pub fn explore(df: &DataFrame, bins: usize) -> Result<ExplorationReport> {
    if bins == 0 {
        return Err(PipelineError::configuration(
            Stage::Explorer,
            "bins",
            "histogram bin count must be at least 1",
        ));
    }

    let numeric = summarize_numeric(df)?;
    let categorical = summarize_categorical(df)?;

    let mut histograms = Vec::with_capacity(numeric.len());
    for summary in &numeric {
        if summary.count > 0 {
            histograms.push(histogram(df, &summary.column, bins)?);
        }
    }

    Ok(ExplorationReport {
        rows: df.height(),
        columns: df.width(),
        numeric,
        categorical,
        histograms,
        missing: count_missing(df)?,
    })
}

/// Summary statistics for every numeric column
pub fn summarize_numeric(df: &DataFrame) -> Result<Vec<NumericSummary>> {
    numeric_column_names(df)
        .into_iter()
        .map(|name| {
            let values: Vec<f64> = numeric_values(df, &name, Stage::Explorer)?
                .into_iter()
                .flatten()
                .collect();
            Ok(describe(name, values))
        })
        .collect()
}

/// Level counts for every string/categorical column
pub fn summarize_categorical(df: &DataFrame) -> Result<Vec<CategoricalSummary>> {
    categorical_column_names(df)
        .into_iter()
        .map(|name| {
            let mut levels: std::collections::BTreeMap<String, usize> = Default::default();
            for value in string_values(df, &name, Stage::Explorer)?.into_iter().flatten() {
                *levels.entry(value).or_insert(0) += 1;
            }
            Ok(CategoricalSummary {
                column: name,
                levels: levels.into_iter().collect(),
            })
        })
        .collect()
}

/// Bin the observed values of a numeric column into `bins` equal-width bins.
pub fn histogram(df: &DataFrame, column: &str, bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(PipelineError::configuration(
            Stage::Explorer,
            "bins",
            "histogram bin count must be at least 1",
        ));
    }

    let values: Vec<f64> = numeric_values(df, column, Stage::Explorer)?
        .into_iter()
        .flatten()
        .collect();
    if values.is_empty() {
        return Err(PipelineError::data(
            Stage::Explorer,
            column,
            "no observed values to bin",
        ));
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    // Constant column: a single bin holds everything
    if max == min {
        return Ok(Histogram {
            column: column.to_string(),
            edges: vec![min, max],
            counts: vec![values.len()],
        });
    }

    let width = (max - min) / bins as f64;
    let mut edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();
    edges[bins] = max;
    // Bins are [lower, upper) except the last, which also holds the maximum
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = edges[1..bins].partition_point(|&edge| edge <= v);
        counts[idx] += 1;
    }

    Ok(Histogram {
        column: column.to_string(),
        edges,
        counts,
    })
}

fn describe(column: String, mut values: Vec<f64>) -> NumericSummary {
    let count = values.len();
    if count == 0 {
        return NumericSummary {
            column,
            count,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q1: f64::NAN,
            median: f64::NAN,
            q3: f64::NAN,
            max: f64::NAN,
        };
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    NumericSummary {
        column,
        count,
        mean,
        std,
        min: values[0],
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values[count - 1],
    }
}

/// Linear interpolation between order statistics of sorted `values`
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_on_interior_edge_goes_to_upper_bin() {
        let df = df! { "x" => [0.0f64, 0.7, 2.1] }.unwrap();
        let hist = histogram(&df, "x", 9).unwrap();
        assert_eq!(hist.edges[3], 0.7);
        assert_eq!(hist.counts[2], 0);
        assert_eq!(hist.counts[3], 1);
        assert_eq!(hist.counts[8], 1);
        assert_eq!(hist.edges[9], 2.1);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&sorted, 0.25) - 1.75).abs() < 1e-12);
        assert!((quantile(&sorted, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&sorted, 0.75) - 3.25).abs() < 1e-12);
    }

    #[test]
    fn test_describe_single_value() {
        let summary = describe("x".to_string(), vec![7.0]);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.median, 7.0);
        assert!(summary.std.is_nan());
    }

    #[test]
    fn test_histogram_last_bin_is_closed() {
        let df = df! { "x" => [0.0f64, 1.0, 2.0, 3.0, 4.0] }.unwrap();
        let hist = histogram(&df, "x", 2).unwrap();
        assert_eq!(hist.edges, vec![0.0, 2.0, 4.0]);
        assert_eq!(hist.counts, vec![2, 3]);
    }

    #[test]
    fn test_histogram_constant_column() {
        let df = df! { "x" => [5.0f64; 4] }.unwrap();
        let hist = histogram(&df, "x", 10).unwrap();
        assert_eq!(hist.counts, vec![4]);
    }

    #[test]
    fn test_zero_bins_is_configuration_error() {
        let df = df! { "x" => [1.0f64, 2.0] }.unwrap();
        assert!(explore(&df, 0).unwrap_err().is_configuration());
    }
}
