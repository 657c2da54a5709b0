//! Terminal styling utilities for the training console output

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static SEED: Emoji<'_, '_> = Emoji("🎲 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
     ██████╗ █████╗ ██████╗ ██████╗ ██╗ ██████╗ ███████╗██╗████████╗
    ██╔════╝██╔══██╗██╔══██╗██╔══██╗██║██╔═══██╗██╔════╝██║╚══██╔══╝
    ██║     ███████║██████╔╝██║  ██║██║██║   ██║█████╗  ██║   ██║
    ██║     ██╔══██║██╔══██╗██║  ██║██║██║   ██║██╔══╝  ██║   ██║
    ╚██████╗██║  ██║██║  ██║██████╔╝██║╚██████╔╝██║     ██║   ██║
     ╚═════╝╚═╝  ╚═╝╚═╝  ╚═╝╚═════╝ ╚═╝ ╚═════╝ ╚═╝     ╚═╝   ╚═╝
    "#;

    println!();
    println!("{}", style(banner).red().bold());
    println!(
        "    {} {}",
        style("♥").red().bold(),
        style("Heart-failure classification with random forests").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(input: &Path, target: &str, tracking_dir: &Path, test_size: f64, cv_folds: usize, seed: u64) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!("    │  {} Input:    {:<37}│", FOLDER, truncate_path(input, 36));
    println!("    │  {} Target:   {:<37}│", TARGET, truncate_string(target, 36));
    println!("    │  {} Tracking: {:<37}│", SAVE, truncate_path(tracking_dir, 36));
    println!("    ├{}┤", line);
    println!(
        "    │  {} Test size:   {:<34}│",
        CHART,
        style(format!("{:.0}%", test_size * 100.0)).yellow()
    );
    println!(
        "    │  {} CV folds:    {:<34}│",
        CHART,
        style(cv_folds).yellow()
    );
    println!(
        "    │  {} Seed:        {:<34}│",
        SEED,
        style(seed).yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print the final completion message
pub fn print_completion(message: &str) {
    println!();
    println!("    {} {}", ROCKET, style(message).green().bold());
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      Found {} {}", style(count).yellow().bold(), description);
    }
}

/// Print a fatal error to stderr
pub fn print_error(kind: &str, message: &str) {
    eprintln!();
    eprintln!(
        "    {} {} {}",
        style("✗").red().bold(),
        style(kind).red().bold(),
        style(message).red()
    );
    eprintln!();
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let tail: String = s
            .chars()
            .rev()
            .take(max_len - 3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}
