//! Run configuration: directory layout, threshold and viewport policy.
//!
//! Layers, lowest precedence first: [`RegressionConfig::default`], a YAML
//! file, `SHOTDIFF_*` environment variables, then explicit `with_*` calls.
//!
//! ```yaml
//! root: visual-tests
//! threshold: 0.98
//! viewports: [desktop, mobile, watch]
//! viewport_fallback: reject
//! ```

use crate::baseline::BaselineStore;
use crate::comparator::{check_threshold, Comparator};
use crate::comparison::DEFAULT_THRESHOLD;
use crate::result::{ShotdiffError, ShotdiffResult};
use crate::runner::RegressionRunner;
use crate::viewport::{Viewport, ViewportFallback};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the root directory
pub const ENV_ROOT: &str = "SHOTDIFF_ROOT";
/// Overrides the pass threshold
pub const ENV_THRESHOLD: &str = "SHOTDIFF_THRESHOLD";

/// Settings for a regression run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Directory holding `screenshots/`, `baselines/` and `comparisons/`
    pub root: PathBuf,
    /// Similarity required to pass
    pub threshold: f64,
    /// Viewport tags recognized in file names
    pub viewports: Vec<Viewport>,
    /// Policy for file names without a recognized viewport
    pub viewport_fallback: ViewportFallback,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("visual_regression"),
            threshold: DEFAULT_THRESHOLD,
            viewports: Viewport::builtins(),
            viewport_fallback: ViewportFallback::default(),
        }
    }
}

impl RegressionConfig {
    /// Defaults rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Parse a YAML file; missing keys keep their defaults
    pub fn from_yaml_file(path: &Path) -> ShotdiffResult<Self> {
        let config: Self = serde_yaml_ng::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SHOTDIFF_ROOT` and `SHOTDIFF_THRESHOLD` from the process environment
    pub fn apply_env(self) -> ShotdiffResult<Self> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_with<F>(mut self, lookup: F) -> ShotdiffResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_ROOT).filter(|v| !v.is_empty()) {
            self.root = PathBuf::from(root);
        }
        if let Some(raw) = lookup(ENV_THRESHOLD).filter(|v| !v.trim().is_empty()) {
            self.threshold = raw.trim().parse().map_err(|_| {
                ShotdiffError::config(format!("{ENV_THRESHOLD} is not a number: {raw:?}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Set the root directory
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Set the pass threshold
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set recognized viewports
    #[must_use]
    pub fn with_viewports(mut self, viewports: Vec<Viewport>) -> Self {
        self.viewports = viewports;
        self
    }

    /// Set the unknown-viewport policy
    #[must_use]
    pub fn with_viewport_fallback(mut self, fallback: ViewportFallback) -> Self {
        self.viewport_fallback = fallback;
        self
    }

    /// Reject out-of-range thresholds and empty viewport lists
    pub fn validate(&self) -> ShotdiffResult<()> {
        check_threshold(self.threshold)?;
        if self.viewports.is_empty() {
            return Err(ShotdiffError::config("at least one viewport is required"));
        }
        Ok(())
    }

    /// `{root}/screenshots`
    #[must_use]
    pub fn screenshots_dir(&self) -> PathBuf {
        self.root.join("screenshots")
    }

    /// `{root}/baselines`
    #[must_use]
    pub fn baselines_dir(&self) -> PathBuf {
        self.root.join("baselines")
    }

    /// `{root}/comparisons`
    #[must_use]
    pub fn comparisons_dir(&self) -> PathBuf {
        self.root.join("comparisons")
    }

    /// Baseline store under this root
    #[must_use]
    pub fn store(&self) -> BaselineStore {
        BaselineStore::new(self.baselines_dir())
    }

    /// Runner wired to this layout
    #[must_use]
    pub fn runner(&self) -> RegressionRunner {
        RegressionRunner::new(self.store(), Comparator::new(self.comparisons_dir()))
            .with_viewports(self.viewports.clone())
            .with_fallback(self.viewport_fallback.clone())
    }
}
