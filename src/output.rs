//! Spinner, colored leveled messages, and summary formatting.
//!
//! This module is the console log sink of a run: it renders the steps and
//! messages emitted through [`UpdateCallbacks`] and prints the final summary.

use crate::config::Config;
use crate::constants::PROGRESS_TICK_MS;
use crate::run::{RunReport, RunStatus};
use crate::update::{BranchResult, Level, UpdateCallbacks, UpdateOutcome, UpdateStep};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// No-op callbacks for when output is not needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl UpdateCallbacks for NoOpCallbacks {
    fn on_step(&self, _step: &UpdateStep) {}
    fn on_complete(&self, _result: &BranchResult) {}
}

/// Console callbacks for a run.
///
/// Normal mode shows a spinner with the current step, verbose mode prints
/// every step on its own line, quiet mode prints only warnings and errors.
pub struct ConsoleCallbacks {
    spinner: Option<ProgressBar>,
    config: Config,
}

impl ConsoleCallbacks {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spinner: create_spinner(&config),
            config,
        }
    }

    pub fn finish(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
    }

    /// Prints a line without tearing the spinner.
    fn print(&self, line: &str) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }
}

impl UpdateCallbacks for ConsoleCallbacks {
    fn on_step(&self, step: &UpdateStep) {
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format!("{}...", step));
        } else if self.config.is_verbose() {
            eprintln!("  {}...", step.to_string().dimmed());
        }
    }

    fn on_message(&self, level: Level, message: &str) {
        if level == Level::Info && self.config.is_quiet() {
            return;
        }
        self.print(&format_message(level, message));
    }

    fn on_complete(&self, result: &BranchResult) {
        if self.config.is_quiet() {
            return;
        }
        self.print(&format!(
            "{} {} {}",
            outcome_symbol(&result.outcome),
            result.local_branch.white().bold(),
            result.outcome.to_string().dimmed()
        ));
    }
}

fn format_message(level: Level, message: &str) -> String {
    match level {
        Level::Info => format!("  {}", message),
        Level::Warning => format!("{} {}", "warning:".yellow().bold(), message.yellow()),
        Level::Error => format!("{} {}", "error:".red().bold(), message.red()),
        Level::Exception => format!(
            "{} {}",
            "fatal:".on_red().white().bold(),
            message.red().bold()
        ),
    }
}

fn outcome_symbol(outcome: &UpdateOutcome) -> colored::ColoredString {
    match outcome {
        UpdateOutcome::Success { .. } => "✓".green(),
        UpdateOutcome::Skipped => "-".dimmed(),
        UpdateOutcome::PushDenied => "!".yellow(),
        _ => "✗".red(),
    }
}

/// Returns `None` in quiet or verbose mode so step lines are not overwritten.
fn create_spinner(config: &Config) -> Option<ProgressBar> {
    if config.is_quiet() || config.is_verbose() {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(PROGRESS_TICK_MS));
    Some(spinner)
}

pub fn print_working_dir(path: &Path, config: &Config) {
    if config.is_quiet() {
        return;
    }
    println!(
        "{} {}",
        "Working in:".cyan(),
        path.display().to_string().white().bold()
    )
}

pub fn print_summary(report: &RunReport, config: &Config) {
    if config.is_quiet() {
        print_quiet_summary(report);
    } else {
        print_normal_summary(report);
    }
}

fn print_quiet_summary(report: &RunReport) {
    let updated = count_updated(&report.results);
    println!("{}/{} branches updated", updated, report.results.len());
    if let Some(line) = status_line(report) {
        eprintln!("error: {}", line);
    }
}

fn print_normal_summary(report: &RunReport) {
    print_section("Summary");

    for result in &report.results {
        println!(
            "  {} {:<30} {} in {}",
            outcome_symbol(&result.outcome),
            result.local_branch.white(),
            result.outcome,
            format_duration(result.duration).dimmed(),
        );
    }
    if !report.results.is_empty() {
        println!();
    }

    if let Some(line) = status_line(report) {
        println!("{}", line.red().bold());
    }
    if !report.is_success() {
        if let Some(hint) = report.recovery_hint() {
            println!("{}", format!("******** {} ********", hint).yellow().bold());
        }
    }

    println!(
        "{}: {}/{} branches updated in {}",
        "Total".white().bold(),
        count_updated(&report.results),
        report.results.len(),
        format_duration(report.duration)
    );
}

fn count_updated(results: &[BranchResult]) -> usize {
    results.iter().filter(|r| r.outcome.is_success()).count()
}

fn status_line(report: &RunReport) -> Option<String> {
    match &report.status {
        RunStatus::Completed => None,
        RunStatus::StartFailed { error } => Some(format!("run not started: {}", error)),
        RunStatus::Aborted { error } => Some(format!("run aborted: {}", error)),
        RunStatus::RestoreFailed { error } => Some(format!("restore failed: {}", error)),
    }
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}

fn print_section(title: &str) {
    let line = "=".repeat(50).cyan().dimmed();
    let padding = (50 - title.len()) / 2;
    let centered = format!("{:>width$}", title, width = padding + title.len());
    println!("\n{}\n{}\n{}\n", line, centered.cyan().bold(), line);
}
