//! Outcome of comparing one screenshot against its baseline.

use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default similarity a screenshot must reach to pass (95%)
pub const DEFAULT_THRESHOLD: f64 = 0.95;

/// Verdict for a single screenshot.
///
/// Three shapes exist, one per constructor:
/// - a performed comparison: metrics present, `passed` decided by threshold
/// - a new baseline: `passed`, `is_new_baseline`, no metrics
/// - an error: not `passed`, `error` set, no metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Whether the screenshot is accepted
    pub passed: bool,
    /// `1 - mean_difference / 255`, in `[0, 1]`
    pub similarity: Option<f64>,
    /// Mean of all pixel-channel differences (0-255)
    pub mean_difference: Option<f64>,
    /// Largest single-channel difference (0-255)
    pub max_difference: Option<f64>,
    /// Similarity required to pass
    pub threshold: f64,
    /// No baseline existed; nothing was compared
    pub is_new_baseline: bool,
    /// Difference image written for failed comparisons
    pub diff_artifact_path: Option<PathBuf>,
    /// Viewport the screenshot was captured under
    pub viewport: Option<Viewport>,
    /// Screenshot under test
    pub screenshot_path: PathBuf,
    /// Baseline it was compared against
    pub baseline_path: Option<PathBuf>,
    /// Why the comparison could not be performed
    pub error: Option<String>,
}

impl ComparisonResult {
    /// Result of a performed comparison
    #[must_use]
    pub fn compared(
        screenshot_path: impl Into<PathBuf>,
        baseline_path: impl Into<PathBuf>,
        stats: DifferenceStats,
        threshold: f64,
    ) -> Self {
        Self {
            passed: stats.similarity >= threshold,
            similarity: Some(stats.similarity),
            mean_difference: Some(stats.mean_difference),
            max_difference: Some(stats.max_difference),
            threshold,
            is_new_baseline: false,
            diff_artifact_path: None,
            viewport: None,
            screenshot_path: screenshot_path.into(),
            baseline_path: Some(baseline_path.into()),
            error: None,
        }
    }

    /// First screenshot for a test/viewport pair
    #[must_use]
    pub fn new_baseline(screenshot_path: impl Into<PathBuf>, threshold: f64) -> Self {
        Self {
            passed: true,
            similarity: None,
            mean_difference: None,
            max_difference: None,
            threshold,
            is_new_baseline: true,
            diff_artifact_path: None,
            viewport: None,
            screenshot_path: screenshot_path.into(),
            baseline_path: None,
            error: None,
        }
    }

    /// Comparison that could not be performed
    #[must_use]
    pub fn failed(
        screenshot_path: impl Into<PathBuf>,
        baseline_path: Option<PathBuf>,
        threshold: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            passed: false,
            similarity: None,
            mean_difference: None,
            max_difference: None,
            threshold,
            is_new_baseline: false,
            diff_artifact_path: None,
            viewport: None,
            screenshot_path: screenshot_path.into(),
            baseline_path,
            error: Some(error.into()),
        }
    }

    /// Tag with the viewport the screenshot was captured under
    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Whether this counts as a regression
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.passed
    }

    /// Whether the comparison itself errored
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Raw statistics produced by a similarity metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferenceStats {
    /// Normalized score in `[0, 1]`, 1 = identical
    pub similarity: f64,
    /// Mean pixel-channel difference
    pub mean_difference: f64,
    /// Maximum pixel-channel difference
    pub max_difference: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn stats(similarity: f64) -> DifferenceStats {
        DifferenceStats {
            similarity,
            mean_difference: (1.0 - similarity) * 255.0,
            max_difference: 255.0,
        }
    }

    #[test]
    fn test_compared_passes_at_threshold() {
        let result = ComparisonResult::compared("a.png", "b.png", stats(0.95), 0.95);
        assert!(result.passed);
        assert_eq!(result.similarity, Some(0.95));
        assert!(!result.is_new_baseline);
    }

    #[test]
    fn test_compared_fails_below_threshold() {
        let result = ComparisonResult::compared("a.png", "b.png", stats(0.90), 0.95);
        assert!(result.is_failure());
        assert!(!result.is_error());
    }

    #[test]
    fn test_new_baseline_invariant() {
        let result = ComparisonResult::new_baseline("a.png", DEFAULT_THRESHOLD);
        assert!(result.passed);
        assert!(result.is_new_baseline);
        assert!(result.similarity.is_none());
        assert!(result.mean_difference.is_none());
        assert!(result.max_difference.is_none());
        assert!(result.baseline_path.is_none());
    }

    #[test]
    fn test_failed_carries_error() {
        let result = ComparisonResult::failed("a.png", None, 0.95, "decode failed");
        assert!(!result.passed);
        assert!(result.is_error());
        assert_eq!(result.error.as_deref(), Some("decode failed"));
        assert!(result.similarity.is_none());
    }

    #[test]
    fn test_with_viewport() {
        let result = ComparisonResult::new_baseline("a.png", 0.95).with_viewport(Viewport::Mobile);
        assert_eq!(result.viewport, Some(Viewport::Mobile));
    }

    #[test]
    fn test_serialize_shape() {
        let result = ComparisonResult::new_baseline("a.png", 0.95);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["is_new_baseline"], true);
        assert!(json["similarity"].is_null());
    }
}
