//! Terminal output and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use mailprobe::{ScenarioOutcome, ScenarioStatus, SuiteReport};
use std::time::Duration;

/// Writes progress and results to stderr
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            spinner: None,
            use_color,
            quiet,
        }
    }

    /// Show a spinner until [`Self::finish`]
    pub fn start_spinner(&mut self, message: &str) {
        if self.quiet {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner.set_message(message.to_string());
        self.spinner = Some(spinner);
    }

    /// Clear the spinner
    pub fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message, even in quiet mode
    pub fn failure(&self, message: &str) {
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// One line per scenario, then the summary
    pub fn report(&self, report: &SuiteReport) {
        for outcome in &report.outcomes {
            let line = outcome_line(outcome);
            match outcome.status {
                ScenarioStatus::Passed => self.success(&line),
                ScenarioStatus::Failed => self.failure(&line),
                ScenarioStatus::Skipped => self.warning(&line),
            }
            if let Some(err) = &outcome.teardown_error {
                self.warning(&format!("{}: teardown failed: {err}", outcome.name));
            }
        }
        self.summary(report);
    }

    /// Print suite summary
    pub fn summary(&self, report: &SuiteReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }
        let line = summary_line(report);
        let _ = self.term.write_line("");
        if self.use_color {
            let status = if failed > 0 {
                Style::new().red().bold().apply_to("FAILED")
            } else {
                Style::new().green().bold().apply_to("PASSED")
            };
            let _ = self.term.write_line(&format!("{status} {line}"));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!("{status} {line}"));
        }
    }
}

/// `name (1.23s)` plus the error and screenshot when present
#[must_use]
pub fn outcome_line(outcome: &ScenarioOutcome) -> String {
    let mut line = format!("{} ({:.2}s)", outcome.name, outcome.duration.as_secs_f64());
    if let Some(err) = &outcome.error {
        line.push_str(": ");
        line.push_str(err);
    }
    if let Some(path) = &outcome.screenshot {
        line.push_str(&format!(" [screenshot: {}]", path.display()));
    }
    line
}

/// Counts and wall time of a finished run
#[must_use]
pub fn summary_line(report: &SuiteReport) -> String {
    let seconds = (report.finished_at - report.started_at)
        .to_std()
        .unwrap_or_default()
        .as_secs_f64();
    format!(
        "{} scenarios in {seconds:.2}s ({} passed, {} failed, {} skipped)",
        report.outcomes.len(),
        report.passed_count(),
        report.failed_count(),
        report.skipped_count()
    )
}
