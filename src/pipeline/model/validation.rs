//! k-fold cross-validation used as a reporting signal during fitting
//!
//! Folds are contiguous chunks of the training row positions, optionally
//! after a seeded permutation, fixed before any fitting starts. Folds are
//! evaluated in parallel but collected in fold order, so the report does
//! not depend on scheduling.

use faer::Mat;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use super::irls::{fit_logistic, fitted};
use super::FitConfig;
use crate::error::{PipelineError, Result, Stage};

/// Default number of folds
pub const DEFAULT_FOLDS: usize = 10;

/// Cross-validation settings, only consulted while fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationConfig {
    pub folds: usize,
    /// Permute the row positions with this seed before chunking
    pub shuffle_seed: Option<u64>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FOLDS)
    }
}

impl ValidationConfig {
    pub fn new(folds: usize) -> Self {
        Self {
            folds,
            shuffle_seed: None,
        }
    }

    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Check the fold count against the number of training rows.
    pub fn validate(&self, rows: usize) -> Result<()> {
        if self.folds < 2 {
            return Err(PipelineError::configuration(
                Stage::Modeler,
                "folds",
                format!("k-fold validation needs at least 2 folds, got {}", self.folds),
            ));
        }
        if self.folds > rows {
            return Err(PipelineError::configuration(
                Stage::Modeler,
                "folds",
                format!("{} folds requested but only {} training rows", self.folds, rows),
            ));
        }
        Ok(())
    }
}

/// Outcome of one held-out fold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldResult {
    /// Zero-based fold number
    pub fold: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub accuracy: f64,
}

/// Per-fold accuracies with their mean and sample variance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidationReport {
    pub folds: Vec<FoldResult>,
    pub mean_accuracy: f64,
    pub accuracy_variance: f64,
}

impl CrossValidationReport {
    pub fn from_folds(folds: Vec<FoldResult>) -> Self {
        let n = folds.len() as f64;
        let mean_accuracy = folds.iter().map(|f| f.accuracy).sum::<f64>() / n;
        let accuracy_variance = if folds.len() > 1 {
            folds
                .iter()
                .map(|f| (f.accuracy - mean_accuracy).powi(2))
                .sum::<f64>()
                / (n - 1.0)
        } else {
            f64::NAN
        };
        Self {
            folds,
            mean_accuracy,
            accuracy_variance,
        }
    }

    pub fn accuracy_std(&self) -> f64 {
        self.accuracy_variance.sqrt()
    }
}

/// Validation row positions for each fold, each list in ascending order.
///
/// The first `rows % folds` folds get one extra row.
pub fn fold_assignments(rows: usize, folds: usize, shuffle_seed: Option<u64>) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..rows).collect();
    if let Some(seed) = shuffle_seed {
        order.shuffle(&mut StdRng::seed_from_u64(seed));
    }

    let base = rows / folds;
    let extra = rows % folds;
    let mut start = 0;
    (0..folds)
        .map(|fold| {
            let size = base + usize::from(fold < extra);
            let mut chunk = order[start..start + size].to_vec();
            chunk.sort_unstable();
            start += size;
            chunk
        })
        .collect()
}

pub(super) fn cross_validate(
    x: &Mat<f64>,
    y: &[f64],
    config: &FitConfig,
) -> Result<CrossValidationReport> {
    let rows = x.nrows();
    config.validation.validate(rows)?;
    let assignments = fold_assignments(
        rows,
        config.validation.folds,
        config.validation.shuffle_seed,
    );

    let folds = assignments
        .par_iter()
        .enumerate()
        .map(|(fold, held_out)| {
            let mut in_fold = vec![false; rows];
            for &i in held_out {
                in_fold[i] = true;
            }
            let train: Vec<usize> = (0..rows).filter(|&i| !in_fold[i]).collect();

            let x_train = Mat::from_fn(train.len(), x.ncols(), |i, j| x[(train[i], j)]);
            let y_train: Vec<f64> = train.iter().map(|&i| y[i]).collect();
            let fit = fit_logistic(
                &x_train,
                &y_train,
                config.penalty,
                config.max_iterations,
                config.tolerance,
            )
            .map_err(|_| {
                PipelineError::data(
                    Stage::Modeler,
                    format!("fold {}", fold + 1),
                    "information matrix is singular; increase the penalty or drop collinear predictors",
                )
            })?;

            let x_val = Mat::from_fn(held_out.len(), x.ncols(), |i, j| x[(held_out[i], j)]);
            let probabilities = fitted(&x_val, &fit.beta);
            let correct = probabilities
                .iter()
                .zip(held_out.iter())
                .filter(|&(&p, &i)| (p >= 0.5) == (y[i] == 1.0))
                .count();

            Ok(FoldResult {
                fold,
                train_rows: train.len(),
                validation_rows: held_out.len(),
                accuracy: correct as f64 / held_out.len() as f64,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CrossValidationReport::from_folds(folds))
}
