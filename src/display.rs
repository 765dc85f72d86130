//! Colored CLI display utilities for test run output.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::parser::{RunError, RunSummary, TestResult};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for truncated attribute values.
const DEFAULT_MAX_LEN: usize = 120;

/// Truncate a string to a maximum length in characters, adding ellipsis if
/// truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize, raw_mode: bool) -> String {
    if raw_mode || s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// Format an attribute value for a single output line.
///
/// Multi-line values are kept intact in raw mode and joined otherwise.
#[must_use]
pub fn format_attribute(value: &str, raw_mode: bool) -> String {
    if raw_mode {
        return value.replace("\r\n", "\n");
    }
    let joined = value
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    truncate(&joined, DEFAULT_MAX_LEN, false)
}

/// Print the command about to run.
pub fn print_run_start(command: &str) {
    println!("{} {} {}", timestamp().dimmed(), "[RUN]".blue().bold(), command.dimmed());
    let _ = io::stdout().flush();
}

/// Print one test result with its attributes.
pub fn print_test(result: &TestResult, raw_mode: bool) {
    let label = format!("[{}]", result.status.to_uppercase());
    if result.passed {
        println!("{} {} {}", timestamp().dimmed(), label.green().bold(), result.name);
    } else {
        println!("{} {} {}", timestamp().dimmed(), label.red().bold(), result.name.bold());
    }
    for (key, value) in &result.attributes {
        println!("    {} {}", format!("{key}:").cyan(), format_attribute(value, raw_mode));
    }
    let _ = io::stdout().flush();
}

/// Print a parser anomaly or runner stderr output.
pub fn print_run_error(err: &RunError, raw_mode: bool) {
    let (label, message) = match err {
        RunError::Stderr(text) => ("[STDERR]", text.trim_end().to_string()),
        other => ("[ERROR]", other.to_string()),
    };
    eprintln!(
        "{} {} {}",
        timestamp().dimmed(),
        label.red().bold(),
        truncate(&message, 500, raw_mode)
    );
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

/// Print the final counts.
pub fn print_summary(summary: &RunSummary, exit_code: Option<i32>) {
    let counts = format!(
        "{} total, {} passed, {} failed",
        summary.total(),
        summary.passed.len(),
        summary.failed.len()
    );
    let code = exit_code.map_or_else(|| "terminated".to_string(), |c| format!("exit code {c}"));
    if summary.is_success() {
        println!(
            "{} {} {} {}",
            timestamp().dimmed(),
            "[DONE]".green().bold(),
            counts,
            format!("({code})").dimmed()
        );
    } else {
        println!(
            "{} {} {} {}",
            timestamp().dimmed(),
            "[DONE]".red().bold(),
            counts,
            format!("({code})").dimmed()
        );
        for result in &summary.failed {
            println!("    {} {}", "-".red(), result.name);
        }
    }
    let _ = io::stdout().flush();
}
