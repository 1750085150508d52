//! JSON export of a complete run

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{
    ClassificationMetrics, CoefficientRow, ConfusionMatrix, CrossValidationReport,
    EliminationStep, ExplorationReport, Model, PipelineConfig,
};

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub glmstep_version: String,
    /// Input file path, or the embedded reference dataset
    pub input_file: String,
    /// Parameters the run was configured with
    pub config: PipelineConfig,
}

/// Final model, flattened for export
#[derive(Serialize)]
pub struct ModelExport {
    pub target: String,
    pub event_value: String,
    pub non_event_value: String,
    pub predictors: Vec<String>,
    pub coefficients: Vec<CoefficientRow>,
    pub deviance: f64,
    pub aic: f64,
    pub iterations: usize,
    pub converged: bool,
    pub training_rows: usize,
}

impl From<&Model> for ModelExport {
    fn from(model: &Model) -> Self {
        Self {
            target: model.target().to_string(),
            event_value: model.target_mapping().event_value.clone(),
            non_event_value: model.target_mapping().non_event_value.clone(),
            predictors: model.predictors().to_vec(),
            coefficients: model.coefficient_table(),
            deviance: model.deviance(),
            aic: model.aic(),
            iterations: model.iterations(),
            converged: model.converged(),
            training_rows: model.training_rows(),
        }
    }
}

/// Held-out evaluation
#[derive(Serialize)]
pub struct EvaluationExport {
    pub confusion_matrix: ConfusionMatrix,
    pub metrics: ClassificationMetrics,
}

/// Everything a run produced
#[derive(Serialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub exploration: ExplorationReport,
    /// Columns filled by imputation, empty when none were needed
    pub imputed_columns: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub cross_validation: CrossValidationReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elimination_steps: Vec<EliminationStep>,
    pub model: ModelExport,
    pub evaluation: EvaluationExport,
}

impl RunMetadata {
    pub fn new(input: Option<&Path>, config: &PipelineConfig) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            glmstep_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: input
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<embedded iris>".to_string()),
            config: config.clone(),
        }
    }
}

impl EvaluationExport {
    pub fn new(confusion_matrix: ConfusionMatrix) -> Self {
        Self {
            metrics: ClassificationMetrics::from(&confusion_matrix),
            confusion_matrix,
        }
    }
}

/// Write the run report as pretty-printed JSON.
///
/// Undefined metrics (NaN) are written as `null`.
pub fn export_run_report(output_path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write run report: {}", output_path.display()))?;
    Ok(())
}
