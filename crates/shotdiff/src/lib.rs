//! Shotdiff: visual regression engine for UI screenshots
//!
//! Screenshots are compared against approved baselines. A comparison scores
//! pixel similarity, applies a pass threshold and writes a difference image
//! when the screenshot regresses. A run aggregates the verdicts for a batch
//! of tests and viewports.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │ CaptureSet  │──►│ RegressionRunner │──►│ RunSummary / │
//! │ (provider)  │   │                  │   │ JSON report  │
//! └─────────────┘   └────────┬─────────┘   └──────────────┘
//!                            │
//!              ┌─────────────┴────────────┐
//!              ▼                          ▼
//!      ┌───────────────┐         ┌──────────────────┐
//!      │ BaselineStore │         │ Comparator<M>    │
//!      │ (manifest)    │         │ SimilarityMetric │
//!      └───────────────┘         └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use shotdiff::{CaptureSet, RegressionConfig};
//!
//! let config = RegressionConfig::new("visual_regression");
//! let captures = CaptureSet::discover(&config.screenshots_dir(), &config.viewports)?;
//! let run = config.runner().run(&captures, config.threshold);
//! let summary = run.summary();
//! println!("{} passed, {} failed", summary.passed, summary.failed);
//! # Ok::<(), shotdiff::ShotdiffError>(())
//! ```

#![warn(missing_docs)]

mod baseline;
mod capture;
mod comparator;
mod comparison;
mod config;
mod report;
mod result;
mod runner;
mod viewport;

pub use baseline::{BaselineEntry, BaselineStore, MANIFEST_FILE};
pub use capture::{
    file_timestamp, result_key, screenshot_file_name, validate_test_name, CaptureSet,
    CapturedScreenshot, Screenshot, IMAGE_EXTENSIONS, TIMESTAMP_FORMAT,
};
pub use comparator::{
    check_threshold, load_image, Comparator, MeanAbsoluteDifference, Measurement,
    SimilarityMetric,
};
pub use comparison::{ComparisonResult, DifferenceStats, DEFAULT_THRESHOLD};
pub use config::{RegressionConfig, ENV_ROOT, ENV_THRESHOLD};
pub use report::{write_json_report, RegressionReport, RunSummary, REPORT_PREFIX};
pub use result::{ShotdiffError, ShotdiffResult};
pub use runner::{
    RegressionRunResult, RegressionRunner, RunObserver, SkippedCapture, TracingObserver,
};
pub use viewport::{Viewport, ViewportFallback};
