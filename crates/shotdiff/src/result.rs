//! Result and error types for Shotdiff.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Shotdiff operations
pub type ShotdiffResult<T> = Result<T, ShotdiffError>;

/// Errors that can occur in Shotdiff
#[derive(Debug, Error)]
pub enum ShotdiffError {
    /// Screenshot handed to `promote` does not exist
    #[error("Cannot promote missing screenshot: {}", path.display())]
    PromotionSourceMissing {
        /// Path that was requested
        path: PathBuf,
    },

    /// Image could not be read or decoded
    #[error("Failed to decode image {}: {message}", path.display())]
    ImageDecode {
        /// Image path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Image processing error (resizing, encoding, etc.)
    #[error("Image processing failed: {message}")]
    ImageProcessing {
        /// Error message
        message: String,
    },

    /// Threshold above 1 or NaN
    #[error("Threshold must be a number no greater than 1, got {value}")]
    InvalidThreshold {
        /// Offending value
        value: f64,
    },

    /// Viewport could not be determined for a screenshot
    #[error("Cannot determine viewport for {}", path.display())]
    UnknownViewport {
        /// Screenshot path
        path: PathBuf,
    },

    /// Invalid name (empty, or containing a path separator)
    #[error("Invalid {kind} name: {name:?}")]
    InvalidName {
        /// What was being named ("test", "viewport")
        kind: &'static str,
        /// Rejected value
        name: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ShotdiffError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an image processing error
    #[must_use]
    pub fn image_processing(message: impl Into<String>) -> Self {
        Self::ImageProcessing {
            message: message.into(),
        }
    }
}
