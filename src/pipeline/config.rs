//! Run configuration shared by the CLI, the stages, and the exported report

use polars::prelude::*;
use serde::Serialize;

use super::columns::categorical_column_names;
use super::explorer::DEFAULT_BINS;
use super::model::{EliminationPolicy, FitConfig, ValidationConfig};
use super::split::{validate_proportion, DEFAULT_TRAIN_FRACTION};
use crate::error::Result;

/// Seed for the split and the fold assignment
pub const DEFAULT_SEED: u64 = 42;

/// Everything a run needs, threaded explicitly through every stage
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Categorical columns expanded into indicator columns; empty means
    /// every categorical column of the dataset
    pub categories: Vec<String>,
    /// Binary target column (usually one of the indicator columns)
    pub target: String,
    /// Predictors; empty means every standardized column
    pub predictors: Vec<String>,
    pub seed: u64,
    pub train_fraction: f64,
    pub bins: usize,
    pub fit: FitConfig,
    pub elimination: EliminationPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            target: "species_setosa".to_string(),
            predictors: Vec::new(),
            seed: DEFAULT_SEED,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            bins: DEFAULT_BINS,
            fit: FitConfig {
                validation: ValidationConfig::default().with_shuffle(DEFAULT_SEED),
                ..Default::default()
            },
            elimination: EliminationPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Check every parameter that does not depend on the data.
    pub fn validate(&self) -> Result<()> {
        validate_proportion(self.train_fraction)?;
        self.fit.validate()?;
        self.elimination.validate()?;
        Ok(())
    }

    /// Categorical columns to encode in `df`.
    pub fn resolve_categories(&self, df: &DataFrame) -> Vec<String> {
        if self.categories.is_empty() {
            categorical_column_names(df)
        } else {
            self.categories.clone()
        }
    }

    /// Predictors to fit, given the names of the standardized columns.
    pub fn resolve_predictors(&self, scaled_columns: &[String]) -> Vec<String> {
        if self.predictors.is_empty() {
            scaled_columns.to_vec()
        } else {
            self.predictors.clone()
        }
    }
}
