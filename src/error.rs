//! Error types for the modeling pipeline.
//!
//! Every failure carries the [`Stage`] that raised it and the column or
//! parameter (`subject`) whose contract was violated, so the binary can
//! abort with a diagnostic that points straight at the bad input.

use std::fmt;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Pipeline stage that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loader,
    Explorer,
    Preprocessor,
    Splitter,
    Modeler,
    Evaluator,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loader => "loader",
            Stage::Explorer => "explorer",
            Stage::Preprocessor => "preprocessor",
            Stage::Splitter => "splitter",
            Stage::Modeler => "modeler",
            Stage::Evaluator => "evaluator",
        };
        f.write_str(name)
    }
}

/// Errors raised by the pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid parameter (split proportion, fold count, ...) or missing
    /// values present where none are allowed.
    #[error("[{stage}] configuration error for '{subject}': {message}")]
    Configuration {
        stage: Stage,
        subject: String,
        message: String,
    },

    /// A referenced column is absent or has the wrong type.
    #[error("[{stage}] schema error for '{subject}': {message}")]
    Schema {
        stage: Stage,
        subject: String,
        message: String,
    },

    /// The data itself cannot satisfy the operation (non-binary target,
    /// empty dataset, zero-variance column, ...).
    #[error("[{stage}] data error for '{subject}': {message}")]
    Data {
        stage: Stage,
        subject: String,
        message: String,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn configuration(stage: Stage, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            stage,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn schema(stage: Stage, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            stage,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn data(stage: Stage, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Data {
            stage,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Stage that raised the error, if it came from a stage contract check.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Configuration { stage, .. } | Self::Schema { stage, .. } | Self::Data { stage, .. } => {
                Some(*stage)
            }
            Self::Polars(_) | Self::Io(_) => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
