//! Run summaries and the persisted JSON report.

use crate::capture::unique_path;
use crate::result::ShotdiffResult;
use crate::runner::RegressionRunResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Report files are named `{REPORT_PREFIX}_{timestamp}.json`
pub const REPORT_PREFIX: &str = "regression_report";

/// Counters derived from a [`RegressionRunResult`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Results recorded (skipped captures excluded)
    pub total: usize,
    /// Comparisons that met the threshold
    pub passed: usize,
    /// Comparisons below the threshold or that errored
    pub failed: usize,
    /// Screenshots with no baseline yet
    pub new_baselines: usize,
    /// Captures that produced no file
    pub skipped: usize,
    /// `passed / total * 100`, or 0 for an empty run
    pub success_rate: f64,
}

impl RunSummary {
    /// Count a finished run
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_run(run: &RegressionRunResult) -> Self {
        let mut summary = Self {
            skipped: run.skipped().len(),
            ..Self::default()
        };
        for (_, _, result) in run.iter() {
            summary.total += 1;
            if result.is_new_baseline {
                summary.new_baselines += 1;
            } else if result.passed {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
        }
        if summary.total > 0 {
            summary.success_rate = summary.passed as f64 / summary.total as f64 * 100.0;
        }
        summary
    }

    /// Whether any screenshot regressed or errored
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Everything persisted for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Counters
    pub summary: RunSummary,
    /// Per-test results
    pub run: RegressionRunResult,
}

impl RegressionReport {
    /// Snapshot a finished run
    #[must_use]
    pub fn new(run: &RegressionRunResult) -> Self {
        Self {
            summary: run.summary(),
            run: run.clone(),
        }
    }

    /// Read a report written by [`write_json_report`]
    pub fn load(path: &Path) -> ShotdiffResult<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

/// Write the run to `dir/regression_report_{started_at}.json`
pub fn write_json_report(run: &RegressionRunResult, dir: &Path) -> ShotdiffResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = unique_path(dir, &format!("{REPORT_PREFIX}_{}", run.started_at), "json");
    let report = RegressionReport::new(run);
    fs::write(&path, serde_json::to_string_pretty(&report)?)?;
    tracing::info!(report = %path.display(), "wrote regression report");
    Ok(path)
}
