//! Baseline store: the reference screenshot for each test/viewport pair.
//!
//! The authoritative baseline for a key is recorded in `manifest.json`
//! inside the baseline directory. Directories populated by other tools
//! (no manifest entry for a key) fall back to a scan for
//! `{test_name}_{viewport}_<timestamp>*` files, where the most recently
//! modified file wins and equal modification times are broken by the
//! greatest file name.
//!
//! Lookups never modify the store. Only [`BaselineStore::promote`] adds
//! baselines.

use crate::capture::{file_timestamp, result_key, unique_path, validate_test_name};
use crate::result::{ShotdiffError, ShotdiffResult};
use crate::runner::RegressionRunResult;
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Manifest file name inside the baseline directory
pub const MANIFEST_FILE: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

/// One manifest record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineEntry {
    /// Test the baseline belongs to
    pub test_name: String,
    /// Viewport it was captured under
    pub viewport: Viewport,
    /// File name inside the baseline directory
    pub file: String,
    /// `YYYYMMDD_HHMMSS` of the promotion
    pub promoted_at: String,
    /// Screenshot the baseline was copied from
    pub source: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    baselines: BTreeMap<String, BaselineEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            baselines: BTreeMap::new(),
        }
    }
}

/// Directory of baseline images plus their manifest
#[derive(Debug, Clone)]
pub struct BaselineStore {
    dir: PathBuf,
}

impl BaselineStore {
    /// Store rooted at `dir` (created lazily on first promotion)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Baseline directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the manifest
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Authoritative baseline for a test/viewport pair.
    ///
    /// `Ok(None)` means no baseline exists yet.
    pub fn find(&self, test_name: &str, viewport: &Viewport) -> ShotdiffResult<Option<PathBuf>> {
        let key = result_key(test_name, viewport);
        if let Some(entry) = self.load_manifest()?.baselines.get(&key) {
            let path = self.dir.join(&entry.file);
            if path.is_file() {
                return Ok(Some(path));
            }
            tracing::warn!(%key, file = %entry.file, "manifest names a missing baseline, scanning directory");
        }
        self.scan(test_name, viewport)
    }

    /// Most recently modified `{test_name}_{viewport}_<timestamp>*` file
    pub fn scan(&self, test_name: &str, viewport: &Viewport) -> ShotdiffResult<Option<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(None);
        }
        let prefix = format!("{}_", result_key(test_name, viewport));

        let mut best: Option<(SystemTime, String, PathBuf)> = None;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            // a timestamp must follow the prefix, so `home` never matches `home_desktop_*` files
            let follows_prefix = name
                .strip_prefix(&prefix)
                .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
            if !follows_prefix {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified()?;
            let newer = best.as_ref().map_or(true, |(t, n, _)| {
                (modified, name.as_str()) > (*t, n.as_str())
            });
            if newer {
                best = Some((modified, name, entry.path()));
            }
        }
        Ok(best.map(|(_, _, path)| path))
    }

    /// Copy `screenshot` into the store as the new baseline for the pair.
    ///
    /// The copy is named `{test_name}_{viewport}_{YYYYMMDD_HHMMSS}.{ext}`
    /// (with a `_N` suffix if promoted twice within a second) and recorded
    /// in the manifest.
    pub fn promote(
        &self,
        screenshot: &Path,
        test_name: &str,
        viewport: &Viewport,
    ) -> ShotdiffResult<PathBuf> {
        validate_test_name(test_name)?;
        if !screenshot.is_file() {
            return Err(ShotdiffError::PromotionSourceMissing {
                path: screenshot.to_path_buf(),
            });
        }
        fs::create_dir_all(&self.dir)?;

        let key = result_key(test_name, viewport);
        let extension = screenshot
            .extension()
            .and_then(|e| e.to_str())
            .map_or_else(|| "png".to_string(), str::to_ascii_lowercase);
        let promoted_at = file_timestamp();
        let target = unique_path(&self.dir, &format!("{key}_{promoted_at}"), &extension);
        fs::copy(screenshot, &target)?;

        let file = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut manifest = self.load_manifest()?;
        manifest.baselines.insert(
            key.clone(),
            BaselineEntry {
                test_name: test_name.to_string(),
                viewport: viewport.clone(),
                file,
                promoted_at,
                source: screenshot.to_path_buf(),
            },
        );
        self.save_manifest(&manifest)?;

        tracing::info!(%key, baseline = %target.display(), "promoted baseline");
        Ok(target)
    }

    /// Promote every new-baseline entry of a finished run
    pub fn promote_new_baselines(&self, run: &RegressionRunResult) -> ShotdiffResult<Vec<PathBuf>> {
        let mut promoted = Vec::new();
        for (test_name, _, result) in run.iter() {
            if !result.is_new_baseline {
                continue;
            }
            let Some(viewport) = &result.viewport else {
                continue;
            };
            promoted.push(self.promote(&result.screenshot_path, test_name, viewport)?);
        }
        Ok(promoted)
    }

    /// All manifest records, ordered by key
    pub fn list(&self) -> ShotdiffResult<Vec<BaselineEntry>> {
        Ok(self.load_manifest()?.baselines.into_values().collect())
    }

    fn load_manifest(&self) -> ShotdiffResult<Manifest> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Ok(Manifest::default());
        }
        let manifest: Manifest = serde_json::from_str(&fs::read_to_string(&path)?)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ShotdiffError::config(format!(
                "Unsupported baseline manifest version {} in {}",
                manifest.version,
                path.display()
            )));
        }
        Ok(manifest)
    }

    fn save_manifest(&self, manifest: &Manifest) -> ShotdiffResult<()> {
        let tmp = self.dir.join(format!(".{MANIFEST_FILE}.tmp"));
        fs::write(&tmp, serde_json::to_string_pretty(manifest)?)?;
        fs::rename(&tmp, self.manifest_path())?;
        Ok(())
    }
}
