//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use shotdiff::{
    ComparisonResult, RunObserver, RunSummary, SkippedCapture, TracingObserver, Viewport,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Run observer that advances a progress bar and forwards to `tracing`
#[derive(Debug)]
pub struct ProgressObserver {
    bar: ProgressBar,
    inner: TracingObserver,
}

impl ProgressObserver {
    /// Observer driving `bar`
    #[must_use]
    pub fn new(bar: ProgressBar) -> Self {
        Self {
            bar,
            inner: TracingObserver,
        }
    }

    /// Captures processed so far
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl RunObserver for ProgressObserver {
    fn capture_missing(&self, test_name: &str, viewport: Option<&Viewport>) {
        self.inner.capture_missing(test_name, viewport);
        self.bar.inc(1);
    }

    fn new_baseline(&self, key: &str, screenshot: &Path) {
        self.inner.new_baseline(key, screenshot);
        self.bar.set_message(key.to_string());
        self.bar.inc(1);
    }

    fn compared(&self, key: &str, result: &ComparisonResult) {
        self.inner.compared(key, result);
        self.bar.set_message(key.to_string());
        self.bar.inc(1);
    }

    fn run_finished(&self, summary: &RunSummary) {
        self.inner.run_finished(summary);
        self.bar.finish_and_clear();
    }
}

/// Progress reporter for command output
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
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
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    /// Observer with a progress bar over `total` captures (hidden when quiet)
    #[must_use]
    pub fn run_observer(&self, total: u64) -> Arc<ProgressObserver> {
        let bar = if self.quiet || !Term::stderr().is_term() {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            pb
        };
        Arc::new(ProgressObserver::new(bar))
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

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a new-baseline notice
    pub fn new_baseline(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("+").cyan().bold().to_string()
        } else {
            "NEW ".to_string()
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

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print one result line
    pub fn result(&self, key: &str, result: &ComparisonResult) {
        let line = describe_result(key, result);
        if result.is_new_baseline {
            self.new_baseline(&line);
        } else if result.passed {
            self.success(&line);
        } else {
            self.failure(&line);
        }
    }

    /// Print a skipped capture
    pub fn skipped(&self, skipped: &SkippedCapture) {
        let viewport = skipped
            .viewport
            .as_ref()
            .map_or("unknown viewport", Viewport::as_str);
        self.warning(&format!(
            "{} ({viewport}): screenshot missing, skipped",
            skipped.test_name
        ));
    }

    /// Print run summary
    pub fn summary(&self, summary: &RunSummary, duration: Duration) {
        if self.quiet && !summary.has_failures() {
            return;
        }

        let _ = self.term.write_line("");
        let secs = duration.as_secs_f64();
        let counts = |passed: String, failed: String, new: String, skipped: String| {
            format!(
                "{} screenshots in {secs:.2}s ({passed} passed, {failed} failed, {new} new, {skipped} skipped, {:.1}% success)",
                summary.total, summary.success_rate
            )
        };

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let muted = Style::new().yellow();

            let status = if summary.has_failures() {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };
            let failed = if summary.has_failures() {
                failed_style.apply_to(summary.failed).to_string()
            } else {
                summary.failed.to_string()
            };
            let line = counts(
                passed_style.apply_to(summary.passed).to_string(),
                failed,
                Style::new().cyan().apply_to(summary.new_baselines).to_string(),
                muted.apply_to(summary.skipped).to_string(),
            );
            let _ = self.term.write_line(&format!("{status} {line}"));
        } else {
            let status = if summary.has_failures() { "FAILED" } else { "PASSED" };
            let line = counts(
                summary.passed.to_string(),
                summary.failed.to_string(),
                summary.new_baselines.to_string(),
                summary.skipped.to_string(),
            );
            let _ = self.term.write_line(&format!("{status} {line}"));
        }
    }
}

/// Plain-text description of one result, without status prefix
#[must_use]
pub fn describe_result(key: &str, result: &ComparisonResult) -> String {
    if let Some(error) = &result.error {
        return format!("{key}: {error}");
    }
    if result.is_new_baseline {
        return format!("{key}: no baseline yet ({})", result.screenshot_path.display());
    }
    let similarity = result.similarity.unwrap_or_default() * 100.0;
    let threshold = result.threshold * 100.0;
    let mut line = if result.passed {
        format!("{key}: {similarity:.2}% similar")
    } else {
        format!("{key}: {similarity:.2}% similar, below {threshold:.2}%")
    };
    if let Some(diff) = &result.diff_artifact_path {
        line.push_str(&format!(" (diff: {})", diff.display()));
    }
    line
}
