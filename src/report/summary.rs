//! Training summary report

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::model::{MetricsRecord, TrainingOutcome};

/// Number of feature importances listed in the summary
const TOP_FEATURES: usize = 5;

/// Summary of one training run
#[derive(Debug, Default)]
pub struct TrainingSummary {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub n_features: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub candidates_evaluated: usize,
    pub best_params: Vec<(String, String)>,
    pub cv_score: f64,
    pub metrics: Option<MetricsRecord>,
    pub top_features: Vec<(String, f64)>,
    pub step_times: Vec<(String, Duration)>,
    pub run_dir: Option<String>,
}

impl TrainingSummary {
    pub fn new(input_rows: usize, duplicates_removed: usize, n_features: usize) -> Self {
        Self {
            input_rows,
            duplicates_removed,
            n_features,
            ..Default::default()
        }
    }

    pub fn record_outcome(&mut self, outcome: &TrainingOutcome) {
        self.train_rows = outcome.split.train.len();
        self.test_rows = outcome.split.test.len();
        self.candidates_evaluated = outcome.search.candidates.len();
        self.best_params = outcome.model.params.to_map().into_iter().collect();
        self.cv_score = outcome.model.cv_score;
        self.metrics = Some(outcome.metrics.clone());
        self.top_features = outcome
            .model
            .feature_importances()
            .into_iter()
            .take(TOP_FEATURES)
            .collect();
    }

    pub fn add_step_time(&mut self, step: &str, elapsed: Duration) {
        self.step_times.push((step.to_string(), elapsed));
    }

    pub fn set_run_dir(&mut self, run_dir: String) {
        self.run_dir = Some(run_dir);
    }

    pub fn total_time(&self) -> Duration {
        self.step_times.iter().map(|(_, d)| *d).sum()
    }

    /// Main metrics table
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📁 Input Rows"), Cell::new(self.input_rows)]);
        table.add_row(vec![
            Cell::new("🗑️  Duplicates Removed"),
            Cell::new(self.duplicates_removed).fg(if self.duplicates_removed == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        table.add_row(vec![Cell::new("🔢 Encoded Features"), Cell::new(self.n_features)]);
        table.add_row(vec![
            Cell::new("✂️  Train / Test"),
            Cell::new(format!("{} / {}", self.train_rows, self.test_rows)),
        ]);
        table.add_row(vec![
            Cell::new("🔍 Combinations Searched"),
            Cell::new(self.candidates_evaluated),
        ]);
        table.add_row(vec![
            Cell::new("📊 CV Accuracy"),
            Cell::new(format!("{:.4}", self.cv_score)),
        ]);

        if let Some(metrics) = &self.metrics {
            for (label, value) in [
                ("🎯 Accuracy", metrics.accuracy),
                ("   Precision", metrics.precision),
                ("   Recall", metrics.recall),
                ("   F1 Score", metrics.f1_score),
            ] {
                table.add_row(vec![
                    Cell::new(label),
                    Cell::new(format!("{:.4}", value))
                        .fg(score_color(value))
                        .add_attribute(Attribute::Bold),
                ]);
            }
            let cm = &metrics.confusion_matrix;
            table.add_row(vec![
                Cell::new("   TN / FP / FN / TP"),
                Cell::new(format!(
                    "{} / {} / {} / {}",
                    cm.true_negatives(),
                    cm.false_positives(),
                    cm.false_negatives(),
                    cm.true_positives()
                )),
            ]);
        }

        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("TRAINING SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        for line in self.to_table().to_string().lines() {
            println!("    {}", line);
        }

        if !self.best_params.is_empty() {
            println!();
            println!("    {} {}", style("⚙").cyan(), style("BEST PARAMETERS").white().bold());
            println!("    {}", style("─".repeat(50)).dim());
            for (name, value) in &self.best_params {
                println!("      {} {}: {}", style("•").dim(), name, style(value).green());
            }
        }

        if !self.top_features.is_empty() {
            println!();
            println!("    {} {}", style("🏆").cyan(), style("TOP FEATURES").white().bold());
            println!("    {}", style("─".repeat(50)).dim());
            for (name, importance) in &self.top_features {
                println!(
                    "      {} {:<24} {}",
                    style("•").dim(),
                    name,
                    style(format!("{:.4}", importance)).cyan()
                );
            }
        }

        if !self.step_times.is_empty() {
            println!();
            println!("    {} {}", style("⏱").cyan(), style("TIMINGS").white().bold());
            println!("    {}", style("─".repeat(50)).dim());
            for (step, elapsed) in &self.step_times {
                println!("      {:<24} {:.2}s", step, elapsed.as_secs_f64());
            }
            println!("      {:<24} {:.2}s", "Total", self.total_time().as_secs_f64());
        }

        if let Some(run_dir) = &self.run_dir {
            println!();
            println!("    {} Run stored in {}", style("📦").cyan(), style(run_dir).yellow());
        }
    }
}

fn score_color(value: f64) -> Color {
    if value >= 0.85 {
        Color::Green
    } else if value >= 0.7 {
        Color::Yellow
    } else {
        Color::Red
    }
}
