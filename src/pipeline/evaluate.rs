//! Confusion matrix and derived classification metrics
//!
//! Every ratio returns NaN when its denominator is zero instead of failing.

use polars::prelude::*;
use serde::Serialize;

use super::model::Model;
use crate::error::{PipelineError, Result, Stage};

/// 2x2 tally of predicted vs. actual binary outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        f64::NAN
    } else {
        numerator as f64 / denominator as f64
    }
}

impl ConfusionMatrix {
    /// Tally paired 0/1 sequences.
    pub fn from_predictions(predicted: &[u8], actual: &[u8]) -> Result<Self> {
        if predicted.len() != actual.len() {
            return Err(PipelineError::data(
                Stage::Evaluator,
                "predictions",
                format!(
                    "{} predictions but {} actual values",
                    predicted.len(),
                    actual.len()
                ),
            ));
        }

        let mut cm = Self::default();
        for (&p, &a) in predicted.iter().zip(actual) {
            match (p, a) {
                (1, 1) => cm.true_positive += 1,
                (0, 0) => cm.true_negative += 1,
                (1, 0) => cm.false_positive += 1,
                (0, 1) => cm.false_negative += 1,
                _ => {
                    return Err(PipelineError::data(
                        Stage::Evaluator,
                        "predictions",
                        format!("values must be 0 or 1, got predicted={} actual={}", p, a),
                    ))
                }
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// True positive rate, TP / (TP + FN)
    pub fn sensitivity(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// True negative rate, TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negative, self.true_negative + self.false_positive)
    }

    /// Positive predictive value, TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn negative_predictive_value(&self) -> f64 {
        ratio(self.true_negative, self.true_negative + self.false_negative)
    }

    pub fn balanced_accuracy(&self) -> f64 {
        (self.sensitivity() + self.specificity()) / 2.0
    }

    /// Cohen's kappa: agreement beyond chance
    pub fn kappa(&self) -> f64 {
        let n = self.total() as f64;
        if n == 0.0 {
            return f64::NAN;
        }
        let observed = self.accuracy();
        let predicted_pos = (self.true_positive + self.false_positive) as f64 / n;
        let actual_pos = (self.true_positive + self.false_negative) as f64 / n;
        let expected = predicted_pos * actual_pos + (1.0 - predicted_pos) * (1.0 - actual_pos);
        if expected == 1.0 {
            f64::NAN
        } else {
            (observed - expected) / (1.0 - expected)
        }
    }
}

/// Derived metrics in one serializable bundle
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub sensitivity: f64,
    pub specificity: f64,
    pub precision: f64,
    pub negative_predictive_value: f64,
    pub balanced_accuracy: f64,
    pub kappa: f64,
}

impl From<&ConfusionMatrix> for ClassificationMetrics {
    fn from(cm: &ConfusionMatrix) -> Self {
        Self {
            accuracy: cm.accuracy(),
            sensitivity: cm.sensitivity(),
            specificity: cm.specificity(),
            precision: cm.precision(),
            negative_predictive_value: cm.negative_predictive_value(),
            balanced_accuracy: cm.balanced_accuracy(),
            kappa: cm.kappa(),
        }
    }
}

/// Predict `rows` with `model` and tally against the model's target column.
pub fn evaluate(model: &Model, rows: &DataFrame) -> Result<ConfusionMatrix> {
    let predicted = model.predict(rows)?;
    let actual = actual_labels(model, rows)?;
    ConfusionMatrix::from_predictions(&predicted, &actual)
}

/// Target values of `rows` encoded with the model's own mapping.
///
/// A held-out set may contain only one class, so the encoding is taken
/// from the model rather than re-derived from `rows`.
fn actual_labels(model: &Model, rows: &DataFrame) -> Result<Vec<u8>> {
    let mapping = model.target_mapping();
    let raw = super::columns::string_values(rows, model.target(), Stage::Evaluator)?;

    // A 0/1 target re-read as strings comes back as "0"/"1"; a numeric
    // pair is matched numerically.
    raw.into_iter()
        .map(|value| {
            let value = value.ok_or_else(|| {
                PipelineError::configuration(
                    Stage::Evaluator,
                    model.target(),
                    "missing value in target column",
                )
            })?;
            if same_label(&value, &mapping.event_value) {
                Ok(1)
            } else if same_label(&value, &mapping.non_event_value) {
                Ok(0)
            } else {
                Err(PipelineError::data(
                    Stage::Evaluator,
                    model.target(),
                    format!(
                        "value '{}' is neither '{}' nor '{}'",
                        value, mapping.event_value, mapping.non_event_value
                    ),
                ))
            }
        })
        .collect()
}

fn same_label(value: &str, label: &str) -> bool {
    if value == label {
        return true;
    }
    match (value.parse::<f64>(), label.parse::<f64>()) {
        (Ok(a), Ok(b)) => (a - b).abs() < 1e-9,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_metrics() {
        let predicted = [1, 1, 0, 0, 1, 0];
        let actual = [1, 0, 0, 1, 1, 0];
        let cm = ConfusionMatrix::from_predictions(&predicted, &actual).unwrap();
        assert_eq!(cm.true_positive, 2);
        assert_eq!(cm.true_negative, 2);
        assert_eq!(cm.false_positive, 1);
        assert_eq!(cm.false_negative, 1);
        assert!((cm.accuracy() - 4.0 / 6.0).abs() < 1e-12);
        assert!((cm.sensitivity() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.specificity() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_denominator_is_nan() {
        let cm = ConfusionMatrix::from_predictions(&[0, 0], &[0, 0]).unwrap();
        assert!(cm.sensitivity().is_nan());
        assert!(cm.precision().is_nan());
        assert_eq!(cm.specificity(), 1.0);
        assert!(cm.kappa().is_nan());

        let empty = ConfusionMatrix::from_predictions(&[], &[]).unwrap();
        assert!(empty.accuracy().is_nan());
    }

    #[test]
    fn test_length_mismatch() {
        let err = ConfusionMatrix::from_predictions(&[1, 0], &[1]).unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn test_non_binary_value() {
        assert!(ConfusionMatrix::from_predictions(&[2], &[1]).unwrap_err().is_data());
    }

    #[test]
    fn test_perfect_kappa() {
        let cm = ConfusionMatrix::from_predictions(&[1, 0, 1, 0], &[1, 0, 1, 0]).unwrap();
        assert!((cm.kappa() - 1.0).abs() < 1e-12);
    }
}
