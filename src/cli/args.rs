//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::{
    EliminationPolicy, FitConfig, ImputeStrategy, PipelineConfig, ValidationConfig,
};

/// glmstep - Explore, split, and fit a logistic regression with k-fold validation
#[derive(Parser, Debug)]
#[command(name = "glmstep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input file path (CSV or Parquet).
    /// If not provided, the embedded iris dataset is used.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Categorical columns expanded into `<column>_<level>` indicator columns
    /// (comma-separated). Defaults to every categorical column.
    #[arg(long, value_delimiter = ',')]
    pub category: Vec<String>,

    /// Binary target column, usually one of the indicator columns
    #[arg(short, long, default_value = "species_setosa")]
    pub target: String,

    /// Predictor columns (comma-separated).
    /// Defaults to every standardized `_scaled` column.
    #[arg(short, long, value_delimiter = ',')]
    pub predictors: Vec<String>,

    /// Seed for the train/test split and the fold assignment
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Proportion of rows used for training, strictly between 0 and 1
    #[arg(long, default_value = "0.8", value_parser = validate_fraction)]
    pub train_fraction: f64,

    /// Number of cross-validation folds (at least 2)
    #[arg(long, default_value = "10", value_parser = validate_folds)]
    pub folds: usize,

    /// Ridge penalty on the coefficients (the intercept is never penalized)
    #[arg(long, default_value = "0.01", value_parser = validate_penalty)]
    pub penalty: f64,

    /// Number of histogram bins per numeric column
    #[arg(long, default_value = "10", value_parser = validate_bins)]
    pub bins: usize,

    /// Fill missing values with this strategy instead of aborting
    #[arg(long, value_enum)]
    pub impute: Option<ImputeStrategy>,

    /// Run guided backward elimination after the first fit
    #[arg(long, default_value = "false")]
    pub eliminate: bool,

    /// Wald p-value above which a predictor becomes an elimination candidate
    #[arg(long, default_value = "0.05", value_parser = validate_probability)]
    pub significance: f64,

    /// Largest relative coefficient shift tolerated when dropping a predictor
    #[arg(long, default_value = "0.10", value_parser = validate_max_shift)]
    pub max_shift: f64,

    /// Skip interactive confirmation prompts and follow the elimination policy
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a dataset and print its exploration tables only
    Explore {
        /// Input file path (CSV or Parquet); defaults to the embedded iris dataset
        input: Option<PathBuf>,

        /// Number of histogram bins per numeric column
        #[arg(long, default_value = "10", value_parser = validate_bins)]
        bins: usize,

        /// Number of rows to use for schema inference (CSV only)
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },
}

impl Cli {
    /// Collect the modeling parameters into a [`PipelineConfig`].
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            categories: self.category.clone(),
            target: self.target.clone(),
            predictors: self.predictors.clone(),
            seed: self.seed,
            train_fraction: self.train_fraction,
            bins: self.bins,
            fit: FitConfig {
                validation: ValidationConfig::new(self.folds).with_shuffle(self.seed),
                penalty: self.penalty,
                ..Default::default()
            },
            elimination: EliminationPolicy {
                significance_level: self.significance,
                max_shift: self.max_shift,
            },
        }
    }
}

fn parse_f64(s: &str) -> Result<f64, String> {
    s.parse()
        .map_err(|_| format!("'{}' is not a valid number", s))
}

/// Validator for train_fraction parameter
fn validate_fraction(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "train_fraction must be strictly between 0.0 and 1.0, got {}",
            value
        ))
    }
}

/// Validator for folds parameter
fn validate_folds(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid fold count", s))?;
    if value < 2 {
        Err(format!("folds must be at least 2, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for penalty parameter
fn validate_penalty(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("penalty must be a finite value >= 0, got {}", value))
    }
}

/// Validator for bins parameter
fn validate_bins(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid bin count", s))?;
    if value == 0 {
        Err("bins must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Validator for significance parameter
fn validate_probability(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "significance must be strictly between 0.0 and 1.0, got {}",
            value
        ))
    }
}

/// Validator for max_shift parameter
fn validate_max_shift(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("max_shift must be a finite value >= 0, got {}", value))
    }
}
