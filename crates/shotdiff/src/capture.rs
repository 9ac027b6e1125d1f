//! Captured screenshots and the file naming convention shared by all artifacts.
//!
//! Screenshots, baselines and diff artifacts embed a second-resolution,
//! lexically sortable timestamp: `{test_name}_{viewport}_{YYYYMMDD_HHMMSS}.png`.

use crate::result::{ShotdiffError, ShotdiffResult};
use crate::viewport::Viewport;
use chrono::Local;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// `strftime` pattern for timestamps embedded in file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// File extensions treated as screenshots
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Current local time formatted as `YYYYMMDD_HHMMSS`
#[must_use]
pub fn file_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Reject test names that cannot be embedded in a file name
pub fn validate_test_name(name: &str) -> ShotdiffResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(ShotdiffError::InvalidName {
            kind: "test",
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Build `{test_name}_{viewport}_{timestamp}.{ext}`
#[must_use]
pub fn screenshot_file_name(
    test_name: &str,
    viewport: &Viewport,
    timestamp: &str,
    extension: &str,
) -> String {
    format!("{test_name}_{viewport}_{timestamp}.{extension}")
}

/// `dir/{base}.{ext}`, or `dir/{base}_{n}.{ext}` when that name is taken
pub(crate) fn unique_path(dir: &Path, base: &str, extension: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{base}.{extension}"));
    let mut n = 1u32;
    while candidate.exists() {
        candidate = dir.join(format!("{base}_{n}.{extension}"));
        n += 1;
    }
    candidate
}

/// Result key for a test/viewport pair: `{test_name}_{viewport}`
#[must_use]
pub fn result_key(test_name: &str, viewport: &Viewport) -> String {
    format!("{test_name}_{viewport}")
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Split a trailing `_YYYYMMDD_HHMMSS` off a stem
fn split_timestamp(stem: &str) -> (&str, Option<&str>) {
    const LEN: usize = "_YYYYMMDD_HHMMSS".len();
    if stem.len() <= LEN || !stem.is_char_boundary(stem.len() - LEN) {
        return (stem, None);
    }
    let (head, tail) = stem.split_at(stem.len() - LEN);
    let bytes = tail.as_bytes();
    let well_formed = bytes[0] == b'_'
        && bytes[9] == b'_'
        && bytes[1..9].iter().all(u8::is_ascii_digit)
        && bytes[10..].iter().all(u8::is_ascii_digit);
    if well_formed {
        (head, Some(&tail[1..]))
    } else {
        (stem, None)
    }
}

/// A screenshot file identified by test name, viewport and capture time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    /// Logical test the screenshot belongs to
    pub test_name: String,
    /// Viewport it was captured under
    pub viewport: Viewport,
    /// `YYYYMMDD_HHMMSS`, when present in the file name
    pub timestamp: Option<String>,
    /// Location on disk
    pub path: PathBuf,
}

impl Screenshot {
    /// Parse a path following the naming convention.
    ///
    /// The viewport segment must be one of `known`; everything before it is
    /// the test name. Returns `None` for names that do not fit.
    #[must_use]
    pub fn parse(path: &Path, known: &[Viewport]) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        let (rest, timestamp) = split_timestamp(stem);
        let (test_name, tag) = rest.rsplit_once('_')?;
        let viewport = known
            .iter()
            .find(|vp| vp.as_str().eq_ignore_ascii_case(tag))?
            .clone();
        if test_name.is_empty() {
            return None;
        }
        Some(Self {
            test_name: test_name.to_string(),
            viewport,
            timestamp: timestamp.map(str::to_string),
            path: path.to_path_buf(),
        })
    }
}

/// One capture attempt handed to the runner.
///
/// `path == None` means the capture provider failed to produce the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedScreenshot {
    /// Explicit viewport; inferred from the file name when absent
    pub viewport: Option<Viewport>,
    /// Image location, or `None` if capture failed
    pub path: Option<PathBuf>,
}

impl CapturedScreenshot {
    /// A capture with its viewport known up front
    #[must_use]
    pub fn tagged(viewport: Viewport, path: impl Into<PathBuf>) -> Self {
        Self {
            viewport: Some(viewport),
            path: Some(path.into()),
        }
    }

    /// A capture whose viewport must be inferred from its file name
    #[must_use]
    pub fn untagged(path: impl Into<PathBuf>) -> Self {
        Self {
            viewport: None,
            path: Some(path.into()),
        }
    }

    /// A failed capture attempt
    #[must_use]
    pub const fn missing(viewport: Option<Viewport>) -> Self {
        Self {
            viewport,
            path: None,
        }
    }
}

/// Insertion-ordered captures grouped by test name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureSet {
    tests: IndexMap<String, Vec<CapturedScreenshot>>,
}

impl CaptureSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one capture to a test
    pub fn push(&mut self, test_name: impl Into<String>, capture: CapturedScreenshot) {
        self.tests.entry(test_name.into()).or_default().push(capture);
    }

    /// Append raw paths (one per viewport attempted, `None` for failures)
    pub fn add_paths<I, P>(&mut self, test_name: impl Into<String>, paths: I)
    where
        I: IntoIterator<Item = Option<P>>,
        P: Into<PathBuf>,
    {
        let entry = self.tests.entry(test_name.into()).or_default();
        entry.extend(paths.into_iter().map(|p| CapturedScreenshot {
            viewport: None,
            path: p.map(Into::into),
        }));
    }

    /// Append captures with explicit viewports
    pub fn add_tagged<I, P>(&mut self, test_name: impl Into<String>, captures: I)
    where
        I: IntoIterator<Item = (Viewport, Option<P>)>,
        P: Into<PathBuf>,
    {
        let entry = self.tests.entry(test_name.into()).or_default();
        entry.extend(captures.into_iter().map(|(vp, p)| CapturedScreenshot {
            viewport: Some(vp),
            path: p.map(Into::into),
        }));
    }

    /// Iterate tests in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CapturedScreenshot])> {
        self.tests.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Captures recorded for one test
    #[must_use]
    pub fn get(&self, test_name: &str) -> Option<&[CapturedScreenshot]> {
        self.tests.get(test_name).map(Vec::as_slice)
    }

    /// Number of tests
    #[must_use]
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether no tests were recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Number of capture attempts across all tests, including failed ones
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.tests.values().map(Vec::len).sum()
    }

    /// Group the screenshots found in `dir` by test name.
    ///
    /// Files are visited in file-name order. Images whose name carries no
    /// known viewport tag are added untagged under their timestamp-stripped
    /// stem, leaving the decision to the runner's [`ViewportFallback`].
    ///
    /// [`ViewportFallback`]: crate::ViewportFallback
    pub fn discover(dir: &Path, known: &[Viewport]) -> ShotdiffResult<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        paths.sort();

        let mut set = Self::new();
        for path in paths {
            match Screenshot::parse(&path, known) {
                Some(shot) => {
                    set.push(shot.test_name, CapturedScreenshot::tagged(shot.viewport, path));
                }
                None => {
                    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                        tracing::debug!(path = %path.display(), "skipping screenshot with non UTF-8 name");
                        continue;
                    };
                    let test_name = split_timestamp(stem).0.to_string();
                    tracing::debug!(path = %path.display(), "no viewport tag in file name");
                    set.push(test_name, CapturedScreenshot::untagged(path));
                }
            }
        }
        Ok(set)
    }
}

impl<S, P> FromIterator<(S, Vec<Option<P>>)> for CaptureSet
where
    S: Into<String>,
    P: Into<PathBuf>,
{
    fn from_iter<T: IntoIterator<Item = (S, Vec<Option<P>>)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (test_name, paths) in iter {
            set.add_paths(test_name, paths);
        }
        set
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_timestamp_shape() {
        let ts = file_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "_");
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_file_name_and_key() {
        let name = screenshot_file_name("login", &Viewport::Mobile, "20240101_120000", "png");
        assert_eq!(name, "login_mobile_20240101_120000.png");
        assert_eq!(result_key("login", &Viewport::Mobile), "login_mobile");
    }

    #[test]
    fn test_unique_path_appends_counter() {
        let dir = TempDir::new().unwrap();
        let first = unique_path(dir.path(), "diff_home", "png");
        assert!(first.ends_with("diff_home.png"));
        fs::write(&first, b"x").unwrap();
        let second = unique_path(dir.path(), "diff_home", "png");
        assert!(second.ends_with("diff_home_1.png"));
    }

    #[test]
    fn test_validate_test_name() {
        assert!(validate_test_name("login_page").is_ok());
        assert!(validate_test_name("").is_err());
        assert!(validate_test_name("..").is_err());
        assert!(validate_test_name("a/b").is_err());
        assert!(validate_test_name("a\\b").is_err());
    }

    #[test]
    fn test_split_timestamp() {
        assert_eq!(
            split_timestamp("home_desktop_20240101_120000"),
            ("home_desktop", Some("20240101_120000"))
        );
        assert_eq!(split_timestamp("home_desktop"), ("home_desktop", None));
        assert_eq!(
            split_timestamp("home_desktop_2024010x_120000"),
            ("home_desktop_2024010x_120000", None)
        );
    }

    #[test]
    fn test_parse_screenshot() {
        let shot = Screenshot::parse(
            Path::new("/s/login_page_tablet_20240101_120000.png"),
            &Viewport::builtins(),
        )
        .unwrap();
        assert_eq!(shot.test_name, "login_page");
        assert_eq!(shot.viewport, Viewport::Tablet);
        assert_eq!(shot.timestamp.as_deref(), Some("20240101_120000"));
    }

    #[test]
    fn test_parse_without_timestamp() {
        let shot = Screenshot::parse(Path::new("home_mobile.png"), &Viewport::builtins()).unwrap();
        assert_eq!(shot.test_name, "home");
        assert!(shot.timestamp.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_viewport() {
        assert!(Screenshot::parse(
            Path::new("home_watch_20240101_120000.png"),
            &Viewport::builtins()
        )
        .is_none());
        assert!(Screenshot::parse(Path::new("_desktop.png"), &Viewport::builtins()).is_none());
    }

    #[test]
    fn test_add_paths_keeps_order_and_missing() {
        let mut set = CaptureSet::new();
        set.add_paths(
            "home",
            vec![Some("home_desktop.png"), None, Some("home_mobile.png")],
        );
        set.add_paths("about", vec![Some("about_desktop.png")]);

        let names: Vec<&str> = set.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["home", "about"]);
        assert_eq!(set.capture_count(), 4);
        assert!(set.get("home").unwrap()[1].path.is_none());
    }

    #[test]
    fn test_from_iter() {
        let set: CaptureSet = vec![("login_page", vec![Some("/tmp/login_desktop.png")])]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
        assert!(set.get("login_page").unwrap()[0].viewport.is_none());
    }

    #[test]
    fn test_discover_groups_by_test() {
        let dir = TempDir::new().unwrap();
        for name in [
            "home_desktop_20240101_120000.png",
            "home_mobile_20240101_120001.png",
            "about_tablet_20240101_120002.jpg",
            "notes.txt",
            "stray.png",
        ] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let set = CaptureSet::discover(dir.path(), &Viewport::builtins()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.capture_count(), 4);
        let home = set.get("home").unwrap();
        assert_eq!(home.len(), 2);
        assert_eq!(home[0].viewport, Some(Viewport::Desktop));
        assert_eq!(home[1].viewport, Some(Viewport::Mobile));
        assert_eq!(set.get("about").unwrap()[0].viewport, Some(Viewport::Tablet));
        let stray = set.get("stray").unwrap();
        assert_eq!(stray[0].viewport, None);
        assert_eq!(stray[0].path, Some(dir.path().join("stray.png")));
    }

    #[test]
    fn test_discover_missing_dir_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(CaptureSet::discover(&dir.path().join("absent"), &Viewport::builtins()).is_err());
    }
}
