//! glmstep: Logistic Regression Workflow CLI
//!
//! Loads a dataset (the embedded iris table by default), explores it,
//! standardizes and one-hot encodes it, splits it, fits a logistic
//! regression with k-fold cross-validation, optionally runs guided
//! backward elimination, and evaluates the final model on held-out rows.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use glmstep::cli::{confirm_drop_predictor, Cli, Commands};
use glmstep::error::Stage;
use glmstep::pipeline::columns::numeric_column_names;
use glmstep::pipeline::{
    add_dummies, backward_eliminate, columns_with_missing, count_missing, ensure_no_missing,
    estimated_memory_mb, evaluate, explore, fit, follow_policy, impute_all, load_or_reference,
    scaled_name, standardize, train_test_split, ExplorationReport,
};
use glmstep::report::{
    export_run_report, print_coefficients, print_confusion_matrix, print_cross_validation,
    print_elimination_steps, print_exploration, print_histogram, EvaluationExport, ModelExport,
    RunMetadata, RunReport, RunSummary,
};
use glmstep::utils::{
    create_spinner, finish_and_clear, finish_with_success, print_banner, print_completion,
    print_config, print_count, print_info, print_step_header, print_step_time, print_success,
    print_warning,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Commands::Explore {
                input,
                bins,
                infer_schema_length,
            } => run_explore(input.as_deref(), *bins, *infer_schema_length),
        };
    }

    let config = cli.to_pipeline_config();
    config.validate()?;

    let input = cli.input.as_deref();
    let input_label = input_label(input);

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&input_label, &config);

    // Step 1: Load dataset
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading dataset...");
    let df = match load_or_reference(input, cli.infer_schema_length) {
        Ok(df) => df,
        Err(e) => {
            finish_and_clear(&spinner);
            return Err(anyhow::Error::from(e).context(format!("Failed to load {}", input_label)));
        }
    };
    finish_with_success(&spinner, "Dataset loaded");
    print_dataset_statistics(df.height(), df.width(), estimated_memory_mb(&df));

    let mut summary = RunSummary::new(df.height());
    let elapsed = step_start.elapsed();
    summary.record_time(Stage::Loader, elapsed);
    print_step_time(elapsed);

    // Step 2: Explore
    print_step_header(2, "Explore");
    let step_start = Instant::now();
    let exploration = explore(&df, config.bins)?;
    print_exploration_report(&exploration);

    let missing_columns = columns_with_missing(&exploration.missing);
    let df = if missing_columns.is_empty() {
        print_success("No missing values");
        df
    } else {
        print_count(
            "column(s) with missing values",
            missing_columns.len(),
            Some(&format!("({} value(s))", exploration.total_missing())),
        );
        match cli.impute {
            Some(strategy) => {
                let imputed = impute_all(&df, strategy)?;
                ensure_no_missing(&count_missing(&imputed)?)
                    .with_context(|| format!("Imputation with '{}' left gaps", strategy))?;
                print_success(&format!("Imputed missing values ({})", strategy));
                summary.imputed_columns = missing_columns;
                imputed
            }
            None => {
                ensure_no_missing(&exploration.missing)?;
                df
            }
        }
    };
    let elapsed = step_start.elapsed();
    summary.record_time(Stage::Explorer, elapsed);
    print_step_time(elapsed);

    // Step 3: Preprocess
    print_step_header(3, "Preprocess");
    let step_start = Instant::now();
    let numeric: Vec<String> = numeric_column_names(&df)
        .into_iter()
        .filter(|c| c != &config.target)
        .collect();
    let df = standardize(&df, &numeric)?;
    print_count("column(s) standardized", numeric.len(), None);
    let categories = config.resolve_categories(&df);
    let mut df = df;
    for category in &categories {
        df = add_dummies(&df, category)?;
        print_success(&format!("Added indicator columns for '{}'", category));
    }
    if categories.is_empty() {
        print_info("No categorical columns to encode");
    }
    let elapsed = step_start.elapsed();
    summary.record_time(Stage::Preprocessor, elapsed);
    print_step_time(elapsed);

    let scaled: Vec<String> = numeric.iter().map(|c| scaled_name(c)).collect();
    let predictors = config.resolve_predictors(&scaled);
    summary.set_predictors(&predictors);

    // Step 4: Split
    print_step_header(4, "Train/Test Split");
    let step_start = Instant::now();
    let split = train_test_split(&df, config.seed, config.train_fraction)?;
    summary.set_split(split.train.height(), split.test.height());
    print_info(&format!(
        "{} training row(s), {} test row(s) (seed {})",
        split.train.height(),
        split.test.height(),
        config.seed
    ));
    let elapsed = step_start.elapsed();
    summary.record_time(Stage::Splitter, elapsed);
    print_step_time(elapsed);

    // Step 5: Model
    print_step_header(5, "Fit Logistic Regression");
    let step_start = Instant::now();
    let spinner = create_spinner(&format!(
        "Fitting {} ~ {} with {}-fold cross-validation...",
        config.target,
        predictors.join(" + "),
        config.fit.validation.folds
    ));
    let outcome = match fit(&split.train, &predictors, &config.target, &config.fit) {
        Ok(outcome) => outcome,
        Err(e) => {
            finish_and_clear(&spinner);
            return Err(e.into());
        }
    };
    finish_with_success(&spinner, "Model fitted");
    print_cross_validation(&outcome.validation);
    print_coefficients(&outcome.model, config.elimination.significance_level);
    if !outcome.model.converged() {
        print_warning("Fit did not converge; consider a larger penalty");
    }

    let mut model = outcome.model;
    let mut validation = outcome.validation;
    let mut elimination_steps = Vec::new();

    if cli.eliminate {
        println!();
        print_info("Running backward elimination");
        let elimination = if cli.no_confirm {
            backward_eliminate(&split.train, &model, &config.fit, &config.elimination, follow_policy)?
        } else {
            backward_eliminate(
                &split.train,
                &model,
                &config.fit,
                &config.elimination,
                confirm_drop_predictor,
            )?
        };

        if elimination.steps.is_empty() {
            print_info("Every predictor is significant; nothing to eliminate");
        } else {
            print_elimination_steps(&elimination.steps);
        }
        if let Some(refit_validation) = elimination.validation {
            validation = refit_validation;
            model = elimination.model;
            print_cross_validation(&validation);
            print_coefficients(&model, config.elimination.significance_level);
        }
        elimination_steps = elimination.steps;
    }
    summary.set_final_predictors(model.predictors());
    summary.cv_mean_accuracy = Some(validation.mean_accuracy);
    let elapsed = step_start.elapsed();
    summary.record_time(Stage::Modeler, elapsed);
    print_step_time(elapsed);

    // Step 6: Evaluate
    print_step_header(6, "Evaluate on Test Set");
    let step_start = Instant::now();
    let confusion = evaluate(&model, &split.test)?;
    print_confusion_matrix(&confusion);
    summary.test_accuracy = Some(confusion.accuracy());
    let elapsed = step_start.elapsed();
    summary.record_time(Stage::Evaluator, elapsed);
    print_step_time(elapsed);

    if let Some(export_path) = &cli.export {
        let report = RunReport {
            metadata: RunMetadata::new(input, &config),
            exploration,
            imputed_columns: summary.imputed_columns.clone(),
            train_rows: split.train.height(),
            test_rows: split.test.height(),
            cross_validation: validation,
            elimination_steps,
            model: ModelExport::from(&model),
            evaluation: EvaluationExport::new(confusion),
        };
        export_run_report(export_path, &report)?;
        println!();
        print_success(&format!("Run report saved to {}", export_path.display()));
    }

    summary.display();
    print_completion();

    Ok(())
}

/// Load a dataset and print its exploration tables only
fn run_explore(input: Option<&Path>, bins: usize, infer_schema_length: usize) -> Result<()> {
    let label = input_label(input);
    let df = load_or_reference(input, infer_schema_length)
        .with_context(|| format!("Failed to load {}", label))?;

    println!();
    print_info(&format!("Exploring {}", label));
    print_dataset_statistics(df.height(), df.width(), estimated_memory_mb(&df));

    let exploration = explore(&df, bins)?;
    print_exploration_report(&exploration);
    println!();
    Ok(())
}

fn print_exploration_report(exploration: &ExplorationReport) {
    print_exploration(exploration);
    for histogram in &exploration.histograms {
        print_histogram(histogram);
    }
}

fn print_dataset_statistics(rows: usize, cols: usize, memory_mb: f64) {
    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);
}

fn input_label(input: Option<&Path>) -> String {
    input
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "embedded iris dataset".to_string())
}
