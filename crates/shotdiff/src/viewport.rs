//! Viewports: named screen-size profiles a page is captured under.
//!
//! The built-in profiles are `desktop`, `tablet` and `mobile`. Any other
//! well-formed tag is accepted as a [`Viewport::Custom`] so capture providers
//! can add profiles without touching this crate.

use crate::result::{ShotdiffError, ShotdiffResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A named screen-size profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Viewport {
    /// 1920x1080
    Desktop,
    /// 768x1024
    Tablet,
    /// 375x667
    Mobile,
    /// Any other profile, identified by its tag
    Custom(String),
}

impl Viewport {
    /// The built-in profiles, in capture order
    #[must_use]
    pub fn builtins() -> Vec<Self> {
        vec![Self::Desktop, Self::Tablet, Self::Mobile]
    }

    /// Tag used in file names and result keys
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
            Self::Mobile => "mobile",
            Self::Custom(tag) => tag,
        }
    }

    /// Pixel dimensions for built-in profiles
    #[must_use]
    pub const fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Self::Desktop => Some((1920, 1080)),
            Self::Tablet => Some((768, 1024)),
            Self::Mobile => Some((375, 667)),
            Self::Custom(_) => None,
        }
    }

    /// Find the viewport tag embedded in a screenshot file name.
    ///
    /// The stem is split on `_` and the last segment equal to one of `known`
    /// wins, so `login_page_desktop_20240101_120000.png` yields `desktop`.
    /// Without a whole-segment match, a case-insensitive substring match is
    /// tried and the rightmost occurrence wins (`homeMobile.png` is `mobile`).
    #[must_use]
    pub fn infer_from_path(path: &Path, known: &[Self]) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?.to_ascii_lowercase();
        let segment = stem
            .split('_')
            .rev()
            .find_map(|segment| known.iter().find(|vp| vp.as_str().eq_ignore_ascii_case(segment)));
        segment
            .or_else(|| {
                known
                    .iter()
                    .filter_map(|vp| {
                        stem.rfind(&vp.as_str().to_ascii_lowercase())
                            .map(|pos| ((pos, vp.as_str().len()), vp))
                    })
                    .max_by_key(|(rank, _)| *rank)
                    .map(|(_, vp)| vp)
            })
            .cloned()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::Desktop
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Viewport {
    type Err = ShotdiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        match tag.as_str() {
            "desktop" => Ok(Self::Desktop),
            "tablet" => Ok(Self::Tablet),
            "mobile" => Ok(Self::Mobile),
            // `_` separates fields in artifact names
            _ if !tag.is_empty()
                && tag
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-') =>
            {
                Ok(Self::Custom(tag))
            }
            _ => Err(ShotdiffError::InvalidName {
                kind: "viewport",
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Viewport {
    type Error = ShotdiffError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Viewport> for String {
    fn from(value: Viewport) -> Self {
        value.as_str().to_string()
    }
}

/// What to do when a screenshot's viewport cannot be inferred from its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportFallback {
    /// Assume this viewport
    Default(Viewport),
    /// Record the screenshot as a failed comparison
    Reject,
}

impl Default for ViewportFallback {
    fn default() -> Self {
        Self::Default(Viewport::Desktop)
    }
}

impl ViewportFallback {
    /// Infer the viewport of `path`, applying this fallback when nothing matches
    pub fn resolve(&self, path: &Path, known: &[Viewport]) -> ShotdiffResult<Viewport> {
        match (Viewport::infer_from_path(path, known), self) {
            (Some(viewport), _) => Ok(viewport),
            (None, Self::Default(viewport)) => Ok(viewport.clone()),
            (None, Self::Reject) => Err(ShotdiffError::UnknownViewport {
                path: path.to_path_buf(),
            }),
        }
    }
}
