//! End-of-run summary

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use serde::Serialize;

use crate::error::Stage;

/// Wall-clock time spent in one stage
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: String,
    pub seconds: f64,
}

/// Headline numbers of a run, collected stage by stage
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub initial_predictors: Vec<String>,
    pub final_predictors: Vec<String>,
    pub dropped_predictors: Vec<String>,
    pub imputed_columns: Vec<String>,
    pub cv_mean_accuracy: Option<f64>,
    pub test_accuracy: Option<f64>,
    pub timings: Vec<StageTiming>,
}

impl RunSummary {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn record_time(&mut self, stage: Stage, elapsed: Duration) {
        self.timings.push(StageTiming {
            stage: stage.to_string(),
            seconds: elapsed.as_secs_f64(),
        });
    }

    pub fn set_split(&mut self, train_rows: usize, test_rows: usize) {
        self.train_rows = train_rows;
        self.test_rows = test_rows;
    }

    pub fn set_predictors(&mut self, predictors: &[String]) {
        self.initial_predictors = predictors.to_vec();
        self.final_predictors = predictors.to_vec();
    }

    /// Record the predictors left after elimination.
    pub fn set_final_predictors(&mut self, predictors: &[String]) {
        self.dropped_predictors = self
            .initial_predictors
            .iter()
            .filter(|p| !predictors.contains(*p))
            .cloned()
            .collect();
        self.final_predictors = predictors.to_vec();
    }

    pub fn total_seconds(&self) -> f64 {
        self.timings.iter().map(|t| t.seconds).sum()
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📁 Rows"), Cell::new(self.rows)]);
        table.add_row(vec![
            Cell::new("✂️  Train / Test"),
            Cell::new(format!("{} / {}", self.train_rows, self.test_rows)),
        ]);
        if !self.imputed_columns.is_empty() {
            table.add_row(vec![
                Cell::new("🩹 Imputed columns"),
                Cell::new(self.imputed_columns.len()).fg(Color::Yellow),
            ]);
        }
        table.add_row(vec![
            Cell::new("📐 Initial predictors"),
            Cell::new(self.initial_predictors.len()),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Eliminated"),
            Cell::new(self.dropped_predictors.len()).fg(if self.dropped_predictors.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("✅ Final predictors"),
            Cell::new(self.final_predictors.len())
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        if let Some(acc) = self.cv_mean_accuracy {
            table.add_row(vec![
                Cell::new("🔁 CV mean accuracy"),
                Cell::new(format!("{:.2}%", acc * 100.0)).fg(Color::Cyan),
            ]);
        }
        if let Some(acc) = self.test_accuracy {
            table.add_row(vec![
                Cell::new("🎯 Test accuracy"),
                Cell::new(format!("{:.2}%", acc * 100.0))
                    .fg(accuracy_color(acc))
                    .add_attribute(Attribute::Bold),
            ]);
        }
        table.add_row(vec![
            Cell::new("⏱  Total time"),
            Cell::new(format!("{:.2}s", self.total_seconds())),
        ]);

        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        if !self.final_predictors.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Final predictors").yellow(),
                style(format!("({})", self.final_predictors.len())).dim()
            );
            for predictor in &self.final_predictors {
                println!("        {} {}", style("•").dim(), predictor);
            }
        }
        if !self.dropped_predictors.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Eliminated").yellow(),
                style(format!("({})", self.dropped_predictors.len())).dim()
            );
            for predictor in &self.dropped_predictors {
                println!("        {} {}", style("•").dim(), predictor);
            }
        }
    }
}

fn accuracy_color(accuracy: f64) -> Color {
    if accuracy >= 0.9 {
        Color::Green
    } else if accuracy >= 0.7 {
        Color::Yellow
    } else {
        Color::Red
    }
}
