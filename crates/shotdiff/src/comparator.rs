//! Screenshot comparison with a pluggable similarity metric.
//!
//! The comparator decodes both images, resamples the baseline onto the
//! current image's dimensions when they differ, drops alpha and hands two
//! same-sized RGB buffers to a [`SimilarityMetric`]. Failures never escape:
//! an undecodable file becomes a failed [`ComparisonResult`] with its error
//! message, so one bad screenshot cannot abort a batch.

use crate::capture::{file_timestamp, unique_path};
use crate::comparison::{ComparisonResult, DifferenceStats};
use crate::result::{ShotdiffError, ShotdiffResult};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader, RgbImage};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Output of a metric: summary statistics plus a rendered difference image
#[derive(Debug, Clone)]
pub struct Measurement {
    /// Similarity, mean and max difference
    pub stats: DifferenceStats,
    /// Image persisted as the diff artifact on failure
    pub diff_image: RgbImage,
}

/// Strategy scoring two RGB images of identical dimensions
pub trait SimilarityMetric: fmt::Debug + Send + Sync {
    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Score `current` against `baseline`
    fn measure(&self, current: &RgbImage, baseline: &RgbImage) -> ShotdiffResult<Measurement>;
}

/// Global mean absolute pixel-channel difference.
///
/// `similarity = 1 - mean / 255`. Coarse by nature: a small layout shift
/// over a flat background barely moves the mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeanAbsoluteDifference;

impl SimilarityMetric for MeanAbsoluteDifference {
    fn name(&self) -> &'static str {
        "mean_absolute_difference"
    }

    fn measure(&self, current: &RgbImage, baseline: &RgbImage) -> ShotdiffResult<Measurement> {
        let (width, height) = current.dimensions();
        if baseline.dimensions() != (width, height) {
            let (bw, bh) = baseline.dimensions();
            return Err(ShotdiffError::image_processing(format!(
                "Image dimensions differ: current {width}x{height}, baseline {bw}x{bh}"
            )));
        }

        let channels = current.as_raw().len();
        let mut diff = Vec::with_capacity(channels);
        let mut total: u64 = 0;
        let mut max: u8 = 0;

        for (a, b) in current.as_raw().iter().zip(baseline.as_raw()) {
            let d = a.abs_diff(*b);
            total += u64::from(d);
            max = max.max(d);
            diff.push(d);
        }

        let mean_difference = if channels > 0 {
            total as f64 / channels as f64
        } else {
            0.0
        };

        let diff_image = RgbImage::from_raw(width, height, diff).ok_or_else(|| {
            ShotdiffError::image_processing("Difference buffer does not match image size")
        })?;

        Ok(Measurement {
            stats: DifferenceStats {
                similarity: 1.0 - mean_difference / 255.0,
                mean_difference,
                max_difference: f64::from(max),
            },
            diff_image,
        })
    }
}

/// Reject thresholds above 1 and NaN
///
/// Anything at or below 0 is accepted and passes every decodable pair.
pub fn check_threshold(threshold: f64) -> ShotdiffResult<()> {
    if threshold.is_nan() || threshold > 1.0 {
        Err(ShotdiffError::InvalidThreshold { value: threshold })
    } else {
        Ok(())
    }
}

/// Decode an image, sniffing the format from content rather than extension
pub fn load_image(path: &Path) -> ShotdiffResult<DynamicImage> {
    let decode_error = |message: String| ShotdiffError::ImageDecode {
        path: path.to_path_buf(),
        message,
    };
    ImageReader::open(path)
        .map_err(|e| decode_error(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?
        .decode()
        .map_err(|e| decode_error(e.to_string()))
}

/// Compares screenshots and persists diff artifacts for failures
#[derive(Debug, Clone)]
pub struct Comparator<M = MeanAbsoluteDifference> {
    metric: M,
    comparisons_dir: PathBuf,
}

impl Comparator {
    /// Comparator using [`MeanAbsoluteDifference`], writing diffs under `comparisons_dir`
    #[must_use]
    pub fn new(comparisons_dir: impl Into<PathBuf>) -> Self {
        Self::with_metric(comparisons_dir, MeanAbsoluteDifference)
    }
}

impl<M: SimilarityMetric> Comparator<M> {
    /// Comparator using a custom metric
    #[must_use]
    pub fn with_metric(comparisons_dir: impl Into<PathBuf>, metric: M) -> Self {
        Self {
            metric,
            comparisons_dir: comparisons_dir.into(),
        }
    }

    /// The metric in use
    #[must_use]
    pub const fn metric(&self) -> &M {
        &self.metric
    }

    /// Where diff artifacts are written
    #[must_use]
    pub fn comparisons_dir(&self) -> &Path {
        &self.comparisons_dir
    }

    /// Compare `current` against `baseline`.
    ///
    /// Never fails: any error is reported as a failed result carrying the
    /// error message.
    pub fn compare(&self, current: &Path, baseline: &Path, threshold: f64) -> ComparisonResult {
        match self.try_compare(current, baseline, threshold) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(
                    current = %current.display(),
                    baseline = %baseline.display(),
                    error = %e,
                    "comparison failed"
                );
                ComparisonResult::failed(current, Some(baseline.to_path_buf()), threshold, e.to_string())
            }
        }
    }

    fn try_compare(
        &self,
        current: &Path,
        baseline: &Path,
        threshold: f64,
    ) -> ShotdiffResult<ComparisonResult> {
        check_threshold(threshold)?;

        let current_img = load_image(current)?;
        let mut baseline_img = load_image(baseline)?;

        let (width, height) = current_img.dimensions();
        if baseline_img.dimensions() != (width, height) {
            let (bw, bh) = baseline_img.dimensions();
            tracing::debug!(
                from = %format!("{bw}x{bh}"),
                to = %format!("{width}x{height}"),
                "resampling baseline"
            );
            baseline_img = baseline_img.resize_exact(width, height, FilterType::Lanczos3);
        }

        let measurement = self
            .metric
            .measure(&current_img.to_rgb8(), &baseline_img.to_rgb8())?;
        tracing::debug!(
            metric = self.metric.name(),
            similarity = measurement.stats.similarity,
            current = %current.display(),
            "measured"
        );

        let mut result = ComparisonResult::compared(current, baseline, measurement.stats, threshold);
        if !result.passed {
            result.diff_artifact_path = Some(self.write_diff(current, &measurement.diff_image)?);
        }
        Ok(result)
    }

    fn write_diff(&self, current: &Path, diff: &RgbImage) -> ShotdiffResult<PathBuf> {
        fs::create_dir_all(&self.comparisons_dir)?;
        let stem = current
            .file_stem()
            .map_or_else(|| "screenshot".into(), |s| s.to_string_lossy());
        let path = unique_path(
            &self.comparisons_dir,
            &format!("diff_{stem}_{}", file_timestamp()),
            "png",
        );
        diff.save_with_format(&path, ImageFormat::Png)
            .map_err(|e| ShotdiffError::image_processing(format!("Failed to write diff image: {e}")))?;
        Ok(path)
    }
}
