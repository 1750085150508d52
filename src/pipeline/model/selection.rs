//! Backward elimination driven by p-values and coefficient stability
//!
//! The unit of work is [`drop_and_refit`]: remove predictors, refit, and
//! measure how far the remaining coefficients moved. A dropped predictor
//! whose removal shifts any remaining coefficient by more than the policy's
//! `max_shift` (relative to that coefficient's previous magnitude) is a
//! confounder and should be kept. [`backward_eliminate`] loops over that
//! primitive, asking a caller-supplied decision function at every step.

use polars::prelude::*;
use serde::Serialize;

use super::validation::CrossValidationReport;
use super::{fit, FitConfig, Model};
use crate::error::{PipelineError, Result, Stage};

/// Result of refitting without some predictors
#[derive(Debug, Clone)]
pub struct Refit {
    pub model: Model,
    pub validation: CrossValidationReport,
    /// Relative shift of every predictor kept in both models
    pub shifts: Vec<(String, f64)>,
    /// Largest entry of `shifts` (0 when nothing remains to compare)
    pub max_coefficient_shift: f64,
}

/// Relative change `|new - old| / |old|`.
///
/// Infinite when a zero coefficient becomes non-zero.
pub fn coefficient_shift(old: f64, new: f64) -> f64 {
    let delta = (new - old).abs();
    if old == 0.0 {
        if delta == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        delta / old.abs()
    }
}

/// Refit `model` on `df` without the predictors in `to_drop`.
pub fn drop_and_refit(model: &Model, df: &DataFrame, to_drop: &[String], config: &FitConfig) -> Result<Refit> {
    if let Some(unknown) = to_drop.iter().find(|d| !model.predictors().contains(*d)) {
        return Err(PipelineError::schema(
            Stage::Modeler,
            unknown.as_str(),
            format!("not a predictor of the model {:?}", model.predictors()),
        ));
    }

    let remaining: Vec<String> = model
        .predictors()
        .iter()
        .filter(|p| !to_drop.contains(*p))
        .cloned()
        .collect();
    if remaining.is_empty() {
        return Err(PipelineError::configuration(
            Stage::Modeler,
            to_drop.join(", "),
            "dropping these would leave the model without predictors",
        ));
    }

    let outcome = fit(df, &remaining, model.target(), config)?;

    let shifts: Vec<(String, f64)> = outcome
        .model
        .coefficients()
        .into_iter()
        .filter_map(|(name, new)| {
            model
                .coefficient(&name)
                .map(|old| (name, coefficient_shift(old, new)))
        })
        .collect();
    let max_coefficient_shift = shifts.iter().map(|(_, s)| *s).fold(0.0, f64::max);

    Ok(Refit {
        model: outcome.model,
        validation: outcome.validation,
        shifts,
        max_coefficient_shift,
    })
}

/// Thresholds guiding elimination
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EliminationPolicy {
    /// Predictors with p-values above this are drop candidates
    pub significance_level: f64,
    /// Relative coefficient shift above which a dropped predictor is kept
    pub max_shift: f64,
}

impl Default for EliminationPolicy {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            max_shift: 0.10,
        }
    }
}

/// Predictor proposed for removal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub predictor: String,
    pub p_value: f64,
}

impl EliminationPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.significance_level.is_nan()
            || self.significance_level <= 0.0
            || self.significance_level >= 1.0
        {
            return Err(PipelineError::configuration(
                Stage::Modeler,
                "significance_level",
                format!("must lie strictly between 0 and 1, got {}", self.significance_level),
            ));
        }
        if self.max_shift.is_nan() || self.max_shift < 0.0 {
            return Err(PipelineError::configuration(
                Stage::Modeler,
                "max_shift",
                format!("must be >= 0, got {}", self.max_shift),
            ));
        }
        Ok(())
    }

    /// Least significant predictor above the significance level, skipping
    /// `exclude`. NaN p-values are never proposed.
    pub fn candidate(&self, model: &Model, exclude: &[String]) -> Option<Candidate> {
        model
            .significance()
            .into_iter()
            .filter(|(name, p)| !exclude.contains(name) && *p > self.significance_level)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(predictor, p_value)| Candidate { predictor, p_value })
    }

    /// Whether the dropped predictor should be put back
    pub fn should_retain(&self, refit: &Refit) -> bool {
        refit.max_coefficient_shift > self.max_shift
    }
}

/// What happened to a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// Removed from the model
    Dropped,
    /// Kept in the model
    Retained,
}

/// One elimination decision
#[derive(Debug, Clone, Serialize)]
pub struct EliminationStep {
    pub predictor: String,
    pub p_value: f64,
    pub max_coefficient_shift: f64,
    /// Whether the policy recommended keeping the predictor
    pub policy_retain: bool,
    pub outcome: StepOutcome,
}

/// Final model and the ordered decision log
#[derive(Debug, Clone)]
pub struct Elimination {
    pub model: Model,
    /// Validation report of the last accepted refit, if any predictor was dropped
    pub validation: Option<CrossValidationReport>,
    pub steps: Vec<EliminationStep>,
}

/// Repeatedly propose the least significant predictor, refit without it,
/// and let `decide` accept or reject the drop.
///
/// `decide` receives the candidate, the refit, and the policy's
/// recommendation (`true` = retain); it returns `true` to drop. The loop
/// stops when no candidate is left or only one predictor remains. A
/// retained predictor is not proposed again.
pub fn backward_eliminate<F>(
    df: &DataFrame,
    model: &Model,
    config: &FitConfig,
    policy: &EliminationPolicy,
    mut decide: F,
) -> Result<Elimination>
where
    F: FnMut(&Candidate, &Refit, bool) -> Result<bool>,
{
    policy.validate()?;

    let mut current = model.clone();
    let mut validation = None;
    let mut retained: Vec<String> = Vec::new();
    let mut steps = Vec::new();

    while current.predictors().len() > 1 {
        let Some(candidate) = policy.candidate(&current, &retained) else {
            break;
        };

        let refit = drop_and_refit(&current, df, std::slice::from_ref(&candidate.predictor), config)?;
        let policy_retain = policy.should_retain(&refit);
        let drop = decide(&candidate, &refit, policy_retain)?;

        steps.push(EliminationStep {
            predictor: candidate.predictor.clone(),
            p_value: candidate.p_value,
            max_coefficient_shift: refit.max_coefficient_shift,
            policy_retain,
            outcome: if drop {
                StepOutcome::Dropped
            } else {
                StepOutcome::Retained
            },
        });

        if drop {
            current = refit.model;
            validation = Some(refit.validation);
        } else {
            retained.push(candidate.predictor);
        }
    }

    Ok(Elimination {
        model: current,
        validation,
        steps,
    })
}

/// Decision function that always follows the policy
pub fn follow_policy(_: &Candidate, _: &Refit, policy_retain: bool) -> Result<bool> {
    Ok(!policy_retain)
}
