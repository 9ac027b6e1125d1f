//! Regression runner: baseline lookup, comparison and aggregation for a batch.
//!
//! ```text
//! CaptureSet ──► for each capture ──► BaselineStore::find
//!                                        │
//!                       ┌────────────────┴───────────────┐
//!                    found                            missing
//!                       │                                │
//!              Comparator::compare              new-baseline result
//!                       │                                │
//!                       └──────────► RegressionRunResult ◄┘
//! ```
//!
//! A run only reads the baseline store. Accepting new baselines is a separate,
//! explicit call to [`BaselineStore::promote`] or
//! [`BaselineStore::promote_new_baselines`].

use crate::baseline::BaselineStore;
use crate::capture::{file_timestamp, result_key, CaptureSet};
use crate::comparator::{Comparator, MeanAbsoluteDifference, SimilarityMetric};
use crate::comparison::ComparisonResult;
use crate::report::RunSummary;
use crate::viewport::{Viewport, ViewportFallback};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Receives progress events from a run.
///
/// Every method has an empty default so observers implement only what they
/// care about.
pub trait RunObserver: fmt::Debug + Send + Sync {
    /// A capture attempt produced no file
    fn capture_missing(&self, _test_name: &str, _viewport: Option<&Viewport>) {}

    /// No baseline exists for `key`
    fn new_baseline(&self, _key: &str, _screenshot: &Path) {}

    /// A comparison finished (passed, failed or errored)
    fn compared(&self, _key: &str, _result: &ComparisonResult) {}

    /// The whole batch finished
    fn run_finished(&self, _summary: &RunSummary) {}
}

/// Observer that emits `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn capture_missing(&self, test_name: &str, viewport: Option<&Viewport>) {
        tracing::warn!(
            test = test_name,
            viewport = viewport.map_or("unknown", Viewport::as_str),
            "screenshot missing, skipped"
        );
    }

    fn new_baseline(&self, key: &str, screenshot: &Path) {
        tracing::info!(key, screenshot = %screenshot.display(), "no baseline yet");
    }

    fn compared(&self, key: &str, result: &ComparisonResult) {
        match (&result.error, result.passed) {
            (Some(error), _) => tracing::error!(key, error = %error, "comparison error"),
            (None, true) => tracing::info!(key, similarity = ?result.similarity, "passed"),
            (None, false) => tracing::warn!(
                key,
                similarity = ?result.similarity,
                threshold = result.threshold,
                diff = ?result.diff_artifact_path,
                "visual regression detected"
            ),
        }
    }

    fn run_finished(&self, summary: &RunSummary) {
        tracing::info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            new_baselines = summary.new_baselines,
            skipped = summary.skipped,
            "regression run finished"
        );
    }
}

/// A capture the provider failed to produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCapture {
    /// Test the capture belonged to
    pub test_name: String,
    /// Viewport attempted, when known
    pub viewport: Option<Viewport>,
}

/// Results of one run: test name → `"{test}_{viewport}"` → result.
///
/// Both levels keep insertion order. Counters are derived through
/// [`RegressionRunResult::summary`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionRunResult {
    /// `YYYYMMDD_HHMMSS` when the run started
    pub started_at: String,
    /// Threshold the run was invoked with
    pub threshold: f64,
    tests: IndexMap<String, IndexMap<String, ComparisonResult>>,
    skipped: Vec<SkippedCapture>,
}

impl RegressionRunResult {
    /// Empty result
    #[must_use]
    pub fn new(started_at: impl Into<String>, threshold: f64) -> Self {
        Self {
            started_at: started_at.into(),
            threshold,
            tests: IndexMap::new(),
            skipped: Vec::new(),
        }
    }

    /// Register a test so it appears even if every capture is skipped
    pub fn ensure_test(&mut self, test_name: &str) {
        if !self.tests.contains_key(test_name) {
            self.tests.insert(test_name.to_string(), IndexMap::new());
        }
    }

    /// Record a result; a repeated key replaces the value in place
    pub fn insert(&mut self, test_name: &str, key: impl Into<String>, result: ComparisonResult) {
        self.ensure_test(test_name);
        if let Some(entries) = self.tests.get_mut(test_name) {
            entries.insert(key.into(), result);
        }
    }

    /// Record a missing capture
    pub fn record_skipped(&mut self, test_name: &str, viewport: Option<Viewport>) {
        self.ensure_test(test_name);
        self.skipped.push(SkippedCapture {
            test_name: test_name.to_string(),
            viewport,
        });
    }

    /// Tests in insertion order with their keyed results
    pub fn tests(&self) -> impl Iterator<Item = (&str, &IndexMap<String, ComparisonResult>)> {
        self.tests.iter().map(|(name, entries)| (name.as_str(), entries))
    }

    /// Every `(test_name, key, result)` triple in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ComparisonResult)> {
        self.tests.iter().flat_map(|(name, entries)| {
            entries
                .iter()
                .map(move |(key, result)| (name.as_str(), key.as_str(), result))
        })
    }

    /// Look up one result
    #[must_use]
    pub fn get(&self, test_name: &str, key: &str) -> Option<&ComparisonResult> {
        self.tests.get(test_name)?.get(key)
    }

    /// Captures skipped because no file was produced
    #[must_use]
    pub fn skipped(&self) -> &[SkippedCapture] {
        &self.skipped
    }

    /// Results that count as failures
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str, &ComparisonResult)> {
        self.iter().filter(|(_, _, result)| result.is_failure())
    }

    /// Derived counters
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_run(self)
    }
}

/// Orchestrates a regression run over a [`CaptureSet`]
#[derive(Debug, Clone)]
pub struct RegressionRunner<M = MeanAbsoluteDifference> {
    store: BaselineStore,
    comparator: Comparator<M>,
    viewports: Vec<Viewport>,
    fallback: ViewportFallback,
    observer: Arc<dyn RunObserver>,
}

impl<M: SimilarityMetric> RegressionRunner<M> {
    /// Runner over `store` using `comparator`, built-in viewports, desktop
    /// fallback and a [`TracingObserver`]
    #[must_use]
    pub fn new(store: BaselineStore, comparator: Comparator<M>) -> Self {
        Self {
            store,
            comparator,
            viewports: Viewport::builtins(),
            fallback: ViewportFallback::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Viewport tags recognized in file names
    #[must_use]
    pub fn with_viewports(mut self, viewports: Vec<Viewport>) -> Self {
        self.viewports = viewports;
        self
    }

    /// Policy for file names without a recognized viewport
    #[must_use]
    pub fn with_fallback(mut self, fallback: ViewportFallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Replace the event observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Baseline store consulted by the run
    #[must_use]
    pub const fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Comparator used by the run
    #[must_use]
    pub const fn comparator(&self) -> &Comparator<M> {
        &self.comparator
    }

    /// Compare every capture in `captures` against its baseline.
    ///
    /// Never fails as a whole: per-screenshot problems become failed
    /// results, missing captures are recorded as skipped.
    pub fn run(&self, captures: &CaptureSet, threshold: f64) -> RegressionRunResult {
        let mut run = RegressionRunResult::new(file_timestamp(), threshold);

        for (test_name, attempts) in captures.iter() {
            run.ensure_test(test_name);
            for capture in attempts {
                let Some(path) = capture.path.as_deref() else {
                    self.observer
                        .capture_missing(test_name, capture.viewport.as_ref());
                    run.record_skipped(test_name, capture.viewport.clone());
                    continue;
                };
                let (key, result) = self.evaluate(test_name, path, capture.viewport.as_ref(), threshold);
                run.insert(test_name, key, result);
            }
        }

        self.observer.run_finished(&run.summary());
        run
    }

    fn evaluate(
        &self,
        test_name: &str,
        path: &Path,
        viewport: Option<&Viewport>,
        threshold: f64,
    ) -> (String, ComparisonResult) {
        let viewport = match viewport {
            Some(vp) => vp.clone(),
            None => match self.fallback.resolve(path, &self.viewports) {
                Ok(vp) => vp,
                Err(e) => {
                    let stem = path
                        .file_stem()
                        .map_or_else(|| "unknown".into(), |s| s.to_string_lossy());
                    let key = format!("{test_name}_{stem}");
                    let result = ComparisonResult::failed(path, None, threshold, e.to_string());
                    self.observer.compared(&key, &result);
                    return (key, result);
                }
            },
        };
        let key = result_key(test_name, &viewport);

        let result = match self.store.find(test_name, &viewport) {
            Ok(Some(_)) if !path.is_file() => {
                let result = ComparisonResult::failed(
                    path,
                    None,
                    threshold,
                    format!("Screenshot not found: {}", path.display()),
                )
                .with_viewport(viewport);
                self.observer.compared(&key, &result);
                result
            }
            Ok(Some(baseline)) => {
                let result = self
                    .comparator
                    .compare(path, &baseline, threshold)
                    .with_viewport(viewport);
                self.observer.compared(&key, &result);
                result
            }
            Ok(None) => {
                self.observer.new_baseline(&key, path);
                ComparisonResult::new_baseline(path, threshold).with_viewport(viewport)
            }
            Err(e) => {
                let result = ComparisonResult::failed(
                    path,
                    None,
                    threshold,
                    format!("Baseline lookup failed: {e}"),
                )
                .with_viewport(viewport);
                self.observer.compared(&key, &result);
                result
            }
        };
        (key, result)
    }
}
