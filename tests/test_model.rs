//! Tests for logistic regression fitting, cross-validation, and elimination

use glmstep::pipeline::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

fn setosa_split() -> Split {
    train_test_split(&prepared_iris(), 42, 0.8).unwrap()
}

fn petal_length() -> Vec<String> {
    vec!["petal_length_scaled".to_string()]
}

#[test]
fn test_setosa_is_perfectly_separated_by_petal_length() {
    let split = setosa_split();
    let outcome = fit(&split.train, &petal_length(), "species_setosa", &FitConfig::default()).unwrap();
    let model = &outcome.model;

    assert!(model.converged());
    assert!(model.coefficient("petal_length_scaled").unwrap() < 0.0);

    let train_cm = evaluate(model, &split.train).unwrap();
    assert_eq!(train_cm.accuracy(), 1.0);

    let test_cm = evaluate(model, &split.test).unwrap();
    assert_eq!(test_cm.total(), 30);
    assert_eq!(test_cm.accuracy(), 1.0);
    assert_eq!(test_cm.false_positive + test_cm.false_negative, 0);
}

#[test]
fn test_cross_validation_report() {
    let split = setosa_split();
    let outcome = fit(&split.train, &petal_length(), "species_setosa", &FitConfig::default()).unwrap();
    let cv = &outcome.validation;

    assert_eq!(cv.folds.len(), 10);
    assert_eq!(cv.folds.iter().map(|f| f.validation_rows).sum::<usize>(), 120);
    for (i, fold) in cv.folds.iter().enumerate() {
        assert_eq!(fold.fold, i);
        assert_eq!(fold.train_rows + fold.validation_rows, 120);
        assert!((0.0..=1.0).contains(&fold.accuracy));
    }
    assert!((cv.mean_accuracy - 1.0).abs() < 1e-12);
    assert!(cv.accuracy_variance.abs() < 1e-12);
}

#[test]
fn test_cross_validation_is_deterministic() {
    let split = setosa_split();
    let predictors = iris_scaled_predictors();
    let config = FitConfig::default();
    let a = fit(&split.train, &predictors, "species_versicolor", &config).unwrap();
    let b = fit(&split.train, &predictors, "species_versicolor", &config).unwrap();

    assert_eq!(a.validation, b.validation);
    assert_eq!(a.model.coefficients(), b.model.coefficients());
}

#[test]
fn test_odds_ratios_are_exponentiated_coefficients() {
    let split = setosa_split();
    let outcome = fit(&split.train, &iris_scaled_predictors(), "species_virginica", &FitConfig::default()).unwrap();
    let model = outcome.model;

    let coefficients = model.coefficients();
    let odds = model.odds_ratios();
    assert_eq!(coefficients.len(), 4);
    for ((name_c, beta), (name_o, ratio)) in coefficients.iter().zip(odds.iter()) {
        assert_eq!(name_c, name_o);
        assert!((ratio - beta.exp()).abs() <= 1e-12 * ratio.abs().max(1.0));
    }

    for (_, p) in model.significance() {
        assert!((0.0..=1.0).contains(&p));
    }
    assert_eq!(model.coefficient_table()[0].term, INTERCEPT);
}

#[test]
fn test_probabilities_are_bounded() {
    let split = setosa_split();
    let outcome = fit(&split.train, &iris_scaled_predictors(), "species_versicolor", &FitConfig::default()).unwrap();
    let probabilities = outcome.model.predict_proba(&split.test).unwrap();
    assert_eq!(probabilities.len(), 30);
    assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));

    let labels = outcome.model.predict(&split.test).unwrap();
    for (p, label) in probabilities.iter().zip(labels.iter()) {
        assert_eq!(*label, u8::from(*p >= DECISION_THRESHOLD));
    }
}

#[test]
fn test_three_level_target_is_data_error() {
    let df = prepared_iris();
    let err = fit(&df, &petal_length(), "species", &FitConfig::default()).unwrap_err();
    assert!(err.is_data());
}

#[test]
fn test_missing_predictor_is_schema_error() {
    let df = prepared_iris();
    let predictors = vec!["petal_area_scaled".to_string()];
    let err = fit(&df, &predictors, "species_setosa", &FitConfig::default()).unwrap_err();
    assert!(err.is_schema());
}

#[test]
fn test_target_as_predictor_is_configuration_error() {
    let df = prepared_iris();
    let predictors = vec!["species_setosa".to_string()];
    let err = fit(&df, &predictors, "species_setosa", &FitConfig::default()).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_too_many_folds_is_configuration_error() {
    let split = setosa_split();
    let config = FitConfig {
        validation: ValidationConfig::new(121),
        ..Default::default()
    };
    let err = fit(&split.train, &petal_length(), "species_setosa", &config).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_predict_requires_every_predictor() {
    let split = setosa_split();
    let outcome = fit(&split.train, &petal_length(), "species_setosa", &FitConfig::default()).unwrap();

    // The raw table has no scaled columns
    let err = outcome.model.predict(&iris()).unwrap_err();
    assert!(err.is_schema());
}

#[test]
fn test_string_target_maps_sorted_first_level_to_zero() {
    let df = create_test_dataframe();
    let config = FitConfig {
        validation: ValidationConfig::new(4),
        ..Default::default()
    };
    let outcome = fit(&df, &["signal".to_string()], "label", &config).unwrap();
    let mapping = outcome.model.target_mapping();
    assert_eq!(mapping.event_value, "yes");
    assert_eq!(mapping.non_event_value, "no");

    // Same labels as the numeric target column, so the same fit
    let numeric = fit(&df, &["signal".to_string()], "target", &config).unwrap();
    let a = outcome.model.coefficient("signal").unwrap();
    let b = numeric.model.coefficient("signal").unwrap();
    assert!((a - b).abs() < 1e-9);
}

#[test]
fn test_drop_and_refit_reports_shifts() {
    let df = create_test_dataframe();
    let config = FitConfig {
        validation: ValidationConfig::new(5),
        ..Default::default()
    };
    let predictors = vec!["signal".to_string(), "noise".to_string()];
    let full = fit(&df, &predictors, "target", &config).unwrap().model;

    let refit = drop_and_refit(&full, &df, &["noise".to_string()], &config).unwrap();
    assert_eq!(refit.model.predictors(), &["signal".to_string()]);
    assert_eq!(refit.shifts.len(), 1);

    let expected = coefficient_shift(
        full.coefficient("signal").unwrap(),
        refit.model.coefficient("signal").unwrap(),
    );
    assert_eq!(refit.shifts[0].0, "signal");
    assert!((refit.shifts[0].1 - expected).abs() < 1e-12);
    assert_eq!(refit.max_coefficient_shift, refit.shifts[0].1);
    assert_eq!(refit.validation.folds.len(), 5);

    // The original model is unchanged
    assert_eq!(full.predictors().len(), 2);
}

#[test]
fn test_drop_and_refit_rejects_unknown_and_total_drops() {
    let df = create_test_dataframe();
    let config = FitConfig {
        validation: ValidationConfig::new(5),
        ..Default::default()
    };
    let model = fit(&df, &["signal".to_string()], "target", &config).unwrap().model;

    let unknown = drop_and_refit(&model, &df, &["noise".to_string()], &config).unwrap_err();
    assert!(unknown.is_schema());

    let everything = drop_and_refit(&model, &df, &["signal".to_string()], &config).unwrap_err();
    assert!(everything.is_configuration());
}

#[test]
fn test_backward_elimination_follows_policy() {
    let split = setosa_split();
    let config = FitConfig::default();
    let policy = EliminationPolicy::default();
    let initial = fit(&split.train, &iris_scaled_predictors(), "species_versicolor", &config)
        .unwrap()
        .model;

    let elimination = backward_eliminate(&split.train, &initial, &config, &policy, follow_policy).unwrap();

    assert!(!elimination.model.predictors().is_empty());
    for predictor in elimination.model.predictors() {
        assert!(initial.predictors().contains(predictor));
    }

    let dropped: Vec<&EliminationStep> = elimination
        .steps
        .iter()
        .filter(|s| s.outcome == StepOutcome::Dropped)
        .collect();
    assert_eq!(
        elimination.model.predictors().len() + dropped.len(),
        initial.predictors().len()
    );
    for step in &elimination.steps {
        assert!(step.p_value > policy.significance_level);
        assert_eq!(step.outcome == StepOutcome::Retained, step.policy_retain);
    }
    assert_eq!(elimination.validation.is_some(), !dropped.is_empty());
}

#[test]
fn test_backward_elimination_respects_rejections() {
    let split = setosa_split();
    let config = FitConfig::default();
    let initial = fit(&split.train, &iris_scaled_predictors(), "species_setosa", &config)
        .unwrap()
        .model;

    let mut asked = 0;
    let elimination = backward_eliminate(
        &split.train,
        &initial,
        &config,
        &EliminationPolicy::default(),
        |_, _, _| {
            asked += 1;
            Ok(false)
        },
    )
    .unwrap();

    // Nothing is ever dropped, and no predictor is proposed twice
    assert_eq!(elimination.model.predictors(), initial.predictors());
    assert_eq!(elimination.steps.len(), asked);
    assert!(asked <= initial.predictors().len());
    assert!(elimination.validation.is_none());
    let mut proposed: Vec<&str> = elimination.steps.iter().map(|s| s.predictor.as_str()).collect();
    proposed.sort_unstable();
    proposed.dedup();
    assert_eq!(proposed.len(), asked);
}

#[test]
fn test_decision_errors_abort_elimination() {
    let split = setosa_split();
    let config = FitConfig::default();
    let initial = fit(&split.train, &iris_scaled_predictors(), "species_setosa", &config)
        .unwrap()
        .model;

    let result = backward_eliminate(
        &split.train,
        &initial,
        &config,
        &EliminationPolicy::default(),
        |candidate, _, _| {
            Err(glmstep::error::PipelineError::configuration(
                glmstep::error::Stage::Modeler,
                candidate.predictor.clone(),
                "cancelled",
            ))
        },
    );
    // Every setosa coefficient is insignificant under the ridge penalty, so
    // at least one candidate is proposed
    assert!(result.unwrap_err().is_configuration());
}

#[test]
fn test_model_fields_survive_serialization() {
    let split = setosa_split();
    let model = fit(&split.train, &petal_length(), "species_setosa", &FitConfig::default())
        .unwrap()
        .model;
    let json = serde_json::to_value(&model).unwrap();
    assert_eq!(json["target"], "species_setosa");
    assert_eq!(json["training_rows"], 120);
}
