//! Run command handler

use super::{resolve_config, CommandStatus};
use crate::commands::RunArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, ProgressReporter};
use shotdiff::{write_json_report, CaptureSet, RegressionReport, ViewportFallback};
use std::time::Instant;

/// Discover screenshots under the root, compare them and report.
pub fn execute_run(cli: &CliConfig, args: &RunArgs) -> CliResult<CommandStatus> {
    let mut config = resolve_config(cli, &args.root, args.threshold)?;
    if args.strict_viewport {
        config = config.with_viewport_fallback(ViewportFallback::Reject);
    }

    let screenshots = config.screenshots_dir();
    if !screenshots.is_dir() {
        return Err(CliError::config(format!(
            "screenshots directory not found: {}",
            screenshots.display()
        )));
    }
    let captures = CaptureSet::discover(&screenshots, &config.viewports)?;
    tracing::debug!(
        tests = captures.len(),
        captures = captures.capture_count(),
        "discovered screenshots"
    );

    let format: OutputFormat = args.format.into();
    let reporter = ProgressReporter::new(
        cli.color.should_color(),
        cli.verbosity.is_quiet() || format == OutputFormat::Json,
    );
    let observer = reporter.run_observer(captures.capture_count() as u64);

    let started = Instant::now();
    let run = config
        .runner()
        .with_observer(observer)
        .run(&captures, config.threshold);
    let summary = run.summary();

    if args.accept_new {
        let promoted = config.store().promote_new_baselines(&run)?;
        if !promoted.is_empty() {
            reporter.info(&format!("promoted {} new baseline(s)", promoted.len()));
        }
    }

    let report_path = if args.no_report {
        None
    } else {
        Some(write_json_report(&run, &config.comparisons_dir())?)
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&RegressionReport::new(&run))?);
        }
        OutputFormat::Text => {
            reporter.header("Visual regression");
            for (_, key, result) in run.iter() {
                reporter.result(key, result);
            }
            for skipped in run.skipped() {
                reporter.skipped(skipped);
            }
            if let Some(path) = &report_path {
                if cli.verbosity.is_verbose() {
                    reporter.info(&format!("report: {}", path.display()));
                }
            }
            reporter.summary(&summary, started.elapsed());
        }
    }

    Ok(CommandStatus::from_failed(summary.has_failures()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{FormatArg, RootArg};
    use crate::config::{ColorChoice, Verbosity};
    use image::{Rgb, RgbImage};
    use shotdiff::{BaselineStore, Viewport};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn quiet() -> CliConfig {
        CliConfig::new()
            .with_verbosity(Verbosity::Quiet)
            .with_color(ColorChoice::Never)
    }

    fn args(root: &Path) -> RunArgs {
        RunArgs {
            root: RootArg {
                root: Some(root.to_path_buf()),
            },
            threshold: None,
            accept_new: false,
            strict_viewport: false,
            format: FormatArg::Text,
            no_report: false,
        }
    }

    fn shot(root: &Path, name: &str, color: [u8; 3]) -> std::path::PathBuf {
        let dir = root.join("screenshots");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        RgbImage::from_pixel(10, 10, Rgb(color)).save(&path).unwrap();
        path
    }

    #[test]
    fn test_missing_screenshots_dir_is_error() {
        let dir = TempDir::new().unwrap();
        let result = execute_run(&quiet(), &args(dir.path()));
        assert!(matches!(result, Err(CliError::Config { .. })));
    }

    #[test]
    fn test_new_baselines_pass_and_write_report() {
        let dir = TempDir::new().unwrap();
        shot(dir.path(), "home_desktop_20240101_120000.png", [255; 3]);

        let status = execute_run(&quiet(), &args(dir.path())).unwrap();
        assert_eq!(status, CommandStatus::Passed);

        let reports: Vec<_> = fs::read_dir(dir.path().join("comparisons"))
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(reports.len(), 1);
        assert!(!dir.path().join("baselines").exists());
    }

    #[test]
    fn test_regression_fails() {
        let dir = TempDir::new().unwrap();
        let seed = shot(dir.path(), "seed.png", [255; 3]);
        BaselineStore::new(dir.path().join("baselines"))
            .promote(&seed, "home", &Viewport::Desktop)
            .unwrap();
        fs::remove_file(&seed).unwrap();
        shot(dir.path(), "home_desktop_20240102_000000.png", [0; 3]);

        let mut run_args = args(dir.path());
        run_args.no_report = true;
        let status = execute_run(&quiet(), &run_args).unwrap();
        assert_eq!(status, CommandStatus::Failed);
        let artifacts: Vec<String> = fs::read_dir(dir.path().join("comparisons"))
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].starts_with("diff_"));
    }

    #[test]
    fn test_accept_new_promotes() {
        let dir = TempDir::new().unwrap();
        shot(dir.path(), "home_mobile_20240101_120000.png", [9; 3]);

        let mut run_args = args(dir.path());
        run_args.accept_new = true;
        run_args.no_report = true;
        execute_run(&quiet(), &run_args).unwrap();

        let store = BaselineStore::new(dir.path().join("baselines"));
        assert!(store.find("home", &Viewport::Mobile).unwrap().is_some());
    }
}
