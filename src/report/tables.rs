//! Per-stage report tables rendered with comfy-table

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{
    ConfusionMatrix, CrossValidationReport, EliminationStep, ExplorationReport, Histogram, Model,
    StepOutcome,
};

/// Width of the widest histogram bar
const BAR_WIDTH: usize = 30;

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn num(value: f64, precision: usize) -> Cell {
    let text = if value.is_nan() {
        "NA".to_string()
    } else {
        format!("{:.*}", precision, value)
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn p_value_cell(p: f64, significance_level: f64) -> Cell {
    let text = if p.is_nan() {
        "NA".to_string()
    } else if p < 1e-4 {
        format!("{:.2e}", p)
    } else {
        format!("{:.4}", p)
    };
    let cell = Cell::new(text).set_alignment(CellAlignment::Right);
    if p <= significance_level {
        cell.fg(Color::Green)
    } else {
        cell.fg(Color::Yellow)
    }
}

/// Indent the table
fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn print_section(title: &str) {
    println!();
    println!("    {}", style(title).white().bold());
}

/// Summary statistics, category counts, and missing values
pub fn print_exploration(report: &ExplorationReport) {
    if !report.numeric.is_empty() {
        print_section("Numeric columns");
        let mut table = new_table(&["Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"]);
        for s in &report.numeric {
            table.add_row(vec![
                Cell::new(&s.column),
                Cell::new(s.count).set_alignment(CellAlignment::Right),
                num(s.mean, 3),
                num(s.std, 3),
                num(s.min, 3),
                num(s.q1, 3),
                num(s.median, 3),
                num(s.q3, 3),
                num(s.max, 3),
            ]);
        }
        print_indented(&table);
    }

    for summary in &report.categorical {
        print_section(&format!("Levels of '{}'", summary.column));
        let mut table = new_table(&["Level", "Count"]);
        for (level, count) in &summary.levels {
            table.add_row(vec![
                Cell::new(level),
                Cell::new(count).set_alignment(CellAlignment::Right),
            ]);
        }
        print_indented(&table);
    }

    print_section("Missing values");
    let mut table = new_table(&["Column", "Missing"]);
    for (column, count) in &report.missing {
        table.add_row(vec![
            Cell::new(column),
            Cell::new(count)
                .set_alignment(CellAlignment::Right)
                .fg(if *count == 0 { Color::Green } else { Color::Red }),
        ]);
    }
    print_indented(&table);
}

/// Text histogram, one row per bin
pub fn print_histogram(histogram: &Histogram) {
    print_section(&format!("Histogram of '{}'", histogram.column));
    let peak = histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    let mut table = new_table(&["Bin", "Count", ""]);
    for (i, count) in histogram.counts.iter().enumerate() {
        let closing = if i + 1 == histogram.counts.len() { "]" } else { ")" };
        let bar_len = count * BAR_WIDTH / peak;
        table.add_row(vec![
            Cell::new(format!(
                "[{:.2}, {:.2}{}",
                histogram.edges[i],
                histogram.edges[i + 1],
                closing
            )),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new("█".repeat(bar_len)).fg(Color::Cyan),
        ]);
    }
    print_indented(&table);
}

/// Per-fold accuracy with mean and variance
pub fn print_cross_validation(report: &CrossValidationReport) {
    print_section(&format!("{}-fold cross-validation", report.folds.len()));
    let mut table = new_table(&["Fold", "Train rows", "Held out", "Accuracy"]);
    for fold in &report.folds {
        table.add_row(vec![
            Cell::new(fold.fold + 1),
            Cell::new(fold.train_rows).set_alignment(CellAlignment::Right),
            Cell::new(fold.validation_rows).set_alignment(CellAlignment::Right),
            num(fold.accuracy, 4),
        ]);
    }
    table.add_row(vec![
        Cell::new("Mean").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        num(report.mean_accuracy, 4).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("Variance"),
        Cell::new(""),
        Cell::new(""),
        num(report.accuracy_variance, 6),
    ]);
    print_indented(&table);
}

/// Estimates, standard errors, z, p-values, and odds ratios
pub fn print_coefficients(model: &Model, significance_level: f64) {
    print_section(&format!(
        "Coefficients for '{}' (event = '{}')",
        model.target(),
        model.target_mapping().event_value
    ));
    let mut table = new_table(&["Term", "Estimate", "Std. Error", "z", "Pr(>|z|)", "Odds ratio"]);
    for row in model.coefficient_table() {
        table.add_row(vec![
            Cell::new(&row.term),
            num(row.estimate, 4),
            num(row.std_error, 4),
            num(row.z_value, 3),
            p_value_cell(row.p_value, significance_level),
            num(row.odds_ratio, 4),
        ]);
    }
    print_indented(&table);
    println!(
        "      {} deviance {:.3}, AIC {:.3}, {} iteration(s){}",
        style("·").dim(),
        model.deviance(),
        model.aic(),
        model.iterations(),
        if model.converged() {
            String::new()
        } else {
            style(" (not converged)").yellow().to_string()
        }
    );
}

/// Ordered log of elimination decisions
pub fn print_elimination_steps(steps: &[EliminationStep]) {
    print_section("Backward elimination");
    let mut table = new_table(&["Step", "Predictor", "p-value", "Max shift", "Policy", "Outcome"]);
    for (i, step) in steps.iter().enumerate() {
        let outcome = match step.outcome {
            StepOutcome::Dropped => Cell::new("dropped").fg(Color::Red),
            StepOutcome::Retained => Cell::new("retained").fg(Color::Green),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&step.predictor),
            num(step.p_value, 4),
            Cell::new(format!("{:.1}%", step.max_coefficient_shift * 100.0))
                .set_alignment(CellAlignment::Right),
            Cell::new(if step.policy_retain { "retain" } else { "drop" }),
            outcome,
        ]);
    }
    print_indented(&table);
}

/// 2x2 matrix followed by the derived metrics
pub fn print_confusion_matrix(cm: &ConfusionMatrix) {
    print_section("Confusion matrix (rows = predicted, columns = actual)");
    let mut table = new_table(&["", "Actual 1", "Actual 0"]);
    table.add_row(vec![
        Cell::new("Predicted 1").add_attribute(Attribute::Bold),
        Cell::new(cm.true_positive).fg(Color::Green),
        Cell::new(cm.false_positive).fg(Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Predicted 0").add_attribute(Attribute::Bold),
        Cell::new(cm.false_negative).fg(Color::Red),
        Cell::new(cm.true_negative).fg(Color::Green),
    ]);
    print_indented(&table);

    let mut metrics = new_table(&["Metric", "Value"]);
    for (name, value) in [
        ("Accuracy", cm.accuracy()),
        ("Sensitivity", cm.sensitivity()),
        ("Specificity", cm.specificity()),
        ("Precision", cm.precision()),
        ("Neg. predictive value", cm.negative_predictive_value()),
        ("Balanced accuracy", cm.balanced_accuracy()),
        ("Kappa", cm.kappa()),
    ] {
        metrics.add_row(vec![Cell::new(name), num(value, 4)]);
    }
    print_indented(&metrics);
}
