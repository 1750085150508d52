//! Logistic regression modeling with k-fold validation
//!
//! [`fit`] validates the inputs, cross-validates on the training rows as a
//! reporting signal, then refits on every training row. The returned
//! [`Model`] is immutable; [`selection`] builds backward elimination on top
//! of it.

mod irls;
pub mod selection;
pub mod validation;

use faer::Mat;
use polars::prelude::*;
use serde::Serialize;
use statrs::function::erf::erfc;

use super::columns::complete_numeric_values;
use super::target::{binary_target, TargetMapping};
use crate::error::{PipelineError, Result, Stage};

pub use selection::{
    backward_eliminate, coefficient_shift, drop_and_refit, follow_policy, Candidate, Elimination,
    EliminationPolicy, EliminationStep, Refit, StepOutcome,
};
pub use validation::{fold_assignments, CrossValidationReport, FoldResult, ValidationConfig};

/// Label used for the intercept in coefficient tables
pub const INTERCEPT: &str = "(Intercept)";

/// Probability at or above which a row is predicted as 1
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Settings for one fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitConfig {
    pub validation: ValidationConfig,
    /// Ridge penalty on every coefficient except the intercept
    pub penalty: f64,
    pub max_iterations: usize,
    /// Convergence tolerance on the penalized log-likelihood
    pub tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            validation: ValidationConfig::default(),
            penalty: 0.01,
            max_iterations: 100,
            tolerance: 1e-8,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.penalty.is_finite() || self.penalty < 0.0 {
            return Err(PipelineError::configuration(
                Stage::Modeler,
                "penalty",
                format!("must be a finite value >= 0, got {}", self.penalty),
            ));
        }
        if self.max_iterations == 0 {
            return Err(PipelineError::configuration(
                Stage::Modeler,
                "max_iterations",
                "at least one iteration is required",
            ));
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(PipelineError::configuration(
                Stage::Modeler,
                "tolerance",
                format!("must be positive, got {}", self.tolerance),
            ));
        }
        Ok(())
    }
}

/// A fitted classifier. Fields are read-only once fit.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    predictors: Vec<String>,
    target: String,
    target_mapping: TargetMapping,
    intercept: f64,
    coefficients: Vec<f64>,
    /// Intercept first, then one per predictor
    std_errors: Vec<f64>,
    penalty: f64,
    iterations: usize,
    converged: bool,
    deviance: f64,
    training_rows: usize,
}

/// One row of the coefficient table
#[derive(Debug, Clone, Serialize)]
pub struct CoefficientRow {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub z_value: f64,
    pub p_value: f64,
    pub odds_ratio: f64,
}

/// A fitted model together with its cross-validation report
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub model: Model,
    pub validation: CrossValidationReport,
}

/// Fit `target ~ predictors` on `df`.
pub fn fit(df: &DataFrame, predictors: &[String], target: &str, config: &FitConfig) -> Result<FitOutcome> {
    config.validate()?;
    check_predictor_list(predictors, target)?;

    let y = binary_target(df, target)?;
    let x = design_matrix(df, predictors)?;
    config.validation.validate(x.nrows())?;

    let validation = validation::cross_validate(&x, &y.values, config)?;

    let raw = irls::fit_logistic(&x, &y.values, config.penalty, config.max_iterations, config.tolerance)
        .map_err(|_| {
            PipelineError::data(
                Stage::Modeler,
                predictors.join(", "),
                "information matrix is singular; increase the penalty or drop collinear predictors",
            )
        })?;

    let model = Model {
        predictors: predictors.to_vec(),
        target: target.to_string(),
        target_mapping: y.mapping,
        intercept: raw.beta[0],
        coefficients: raw.beta[1..].to_vec(),
        std_errors: raw.std_errors,
        penalty: config.penalty,
        iterations: raw.iterations,
        converged: raw.converged,
        deviance: raw.deviance,
        training_rows: x.nrows(),
    };

    Ok(FitOutcome { model, validation })
}

impl Model {
    pub fn predictors(&self) -> &[String] {
        &self.predictors
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn target_mapping(&self) -> &TargetMapping {
        &self.target_mapping
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn deviance(&self) -> f64 {
        self.deviance
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    /// Akaike information criterion from the unpenalized deviance
    pub fn aic(&self) -> f64 {
        self.deviance + 2.0 * (self.predictors.len() + 1) as f64
    }

    /// Predictor -> coefficient, in predictor order
    pub fn coefficients(&self) -> Vec<(String, f64)> {
        self.predictors
            .iter()
            .cloned()
            .zip(self.coefficients.iter().copied())
            .collect()
    }

    /// Coefficient of one predictor
    pub fn coefficient(&self, predictor: &str) -> Option<f64> {
        self.predictors
            .iter()
            .position(|p| p == predictor)
            .map(|i| self.coefficients[i])
    }

    /// Predictor -> exp(coefficient)
    pub fn odds_ratios(&self) -> Vec<(String, f64)> {
        self.coefficients()
            .into_iter()
            .map(|(name, beta)| (name, beta.exp()))
            .collect()
    }

    /// Predictor -> two-sided Wald p-value
    pub fn significance(&self) -> Vec<(String, f64)> {
        self.predictors
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), wald_p_value(self.coefficients[i], self.std_errors[i + 1])))
            .collect()
    }

    /// Full coefficient table, intercept first
    pub fn coefficient_table(&self) -> Vec<CoefficientRow> {
        let terms = std::iter::once((INTERCEPT.to_string(), self.intercept)).chain(self.coefficients());
        terms
            .zip(self.std_errors.iter())
            .map(|((term, estimate), &std_error)| CoefficientRow {
                term,
                estimate,
                std_error,
                z_value: estimate / std_error,
                p_value: wald_p_value(estimate, std_error),
                odds_ratio: estimate.exp(),
            })
            .collect()
    }

    /// Probability of the event for every row of `rows`.
    ///
    /// Every predictor must be present as a numeric column; other columns
    /// are ignored.
    pub fn predict_proba(&self, rows: &DataFrame) -> Result<Vec<f64>> {
        let x = design_matrix(rows, &self.predictors)?;
        let beta: Vec<f64> = std::iter::once(self.intercept)
            .chain(self.coefficients.iter().copied())
            .collect();
        Ok(irls::fitted(&x, &beta))
    }

    /// 0/1 predictions at the 0.5 threshold
    pub fn predict(&self, rows: &DataFrame) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(rows)?
            .into_iter()
            .map(|p| u8::from(p >= DECISION_THRESHOLD))
            .collect())
    }
}

fn wald_p_value(estimate: f64, std_error: f64) -> f64 {
    if std_error.is_nan() || std_error <= 0.0 {
        return f64::NAN;
    }
    let z = estimate / std_error;
    erfc(z.abs() / std::f64::consts::SQRT_2)
}

fn check_predictor_list(predictors: &[String], target: &str) -> Result<()> {
    if predictors.is_empty() {
        return Err(PipelineError::configuration(
            Stage::Modeler,
            "predictors",
            "at least one predictor is required",
        ));
    }
    if predictors.iter().any(|p| p == target) {
        return Err(PipelineError::configuration(
            Stage::Modeler,
            target,
            "the target cannot also be a predictor",
        ));
    }
    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = predictors.iter().find(|p| !seen.insert(p.as_str())) {
        return Err(PipelineError::configuration(
            Stage::Modeler,
            dup.as_str(),
            "predictor listed more than once",
        ));
    }
    Ok(())
}

/// Intercept column followed by one column per predictor
fn design_matrix(df: &DataFrame, predictors: &[String]) -> Result<Mat<f64>> {
    let columns: Vec<Vec<f64>> = predictors
        .iter()
        .map(|name| complete_numeric_values(df, name, Stage::Modeler))
        .collect::<Result<_>>()?;

    let rows = df.height();
    if rows == 0 {
        return Err(PipelineError::data(Stage::Modeler, "dataset", "no rows to model"));
    }

    Ok(Mat::from_fn(rows, predictors.len() + 1, |i, j| {
        if j == 0 {
            1.0
        } else {
            columns[j - 1][i]
        }
    }))
}
