//! Baseline store handlers: promote, baseline, baselines

use super::{parse_viewport, resolve_config, CommandStatus};
use crate::commands::{BaselineArgs, BaselinesArgs, PromoteArgs};
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{OutputFormat, ProgressReporter};

/// Copy a screenshot into the store as the approved baseline
pub fn execute_promote(cli: &CliConfig, args: &PromoteArgs) -> CliResult<CommandStatus> {
    let viewport = parse_viewport(&args.viewport)?;
    let config = resolve_config(cli, &args.root, None)?;
    let target = config.store().promote(&args.screenshot, &args.test, &viewport)?;
    tracing::info!(
        test = %args.test,
        viewport = %viewport,
        baseline = %target.display(),
        "promoted screenshot"
    );

    let reporter = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet());
    reporter.success(&format!(
        "{}_{viewport}: baseline {}",
        args.test,
        target.display()
    ));
    Ok(CommandStatus::Passed)
}

/// Print the path of the authoritative baseline; fails when none exists
pub fn execute_baseline(cli: &CliConfig, args: &BaselineArgs) -> CliResult<CommandStatus> {
    let viewport = parse_viewport(&args.viewport)?;
    let config = resolve_config(cli, &args.root, None)?;

    match config.store().find(&args.test, &viewport)? {
        Some(path) => {
            println!("{}", path.display());
            Ok(CommandStatus::Passed)
        }
        None => {
            eprintln!("no baseline for {}_{viewport}", args.test);
            Ok(CommandStatus::Failed)
        }
    }
}

/// List manifest records
pub fn execute_baselines(cli: &CliConfig, args: &BaselinesArgs) -> CliResult<CommandStatus> {
    let config = resolve_config(cli, &args.root, None)?;
    let entries = config.store().list()?;

    match OutputFormat::from(args.format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            if entries.is_empty() && !cli.verbosity.is_quiet() {
                eprintln!("no baselines in {}", config.baselines_dir().display());
            }
            for entry in &entries {
                println!(
                    "{}_{}\t{}\t{}",
                    entry.test_name, entry.viewport, entry.promoted_at, entry.file
                );
            }
        }
    }
    Ok(CommandStatus::Passed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{FormatArg, RootArg};
    use crate::config::Verbosity;
    use crate::error::CliError;
    use image::{Rgb, RgbImage};
    use shotdiff::{BaselineStore, ShotdiffError, Viewport};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn quiet() -> CliConfig {
        CliConfig::new().with_verbosity(Verbosity::Quiet)
    }

    fn root(dir: &Path) -> RootArg {
        RootArg {
            root: Some(dir.to_path_buf()),
        }
    }

    fn promote_args(dir: &Path, screenshot: PathBuf, viewport: &str) -> PromoteArgs {
        PromoteArgs {
            screenshot,
            test: "home".into(),
            viewport: viewport.into(),
            root: root(dir),
        }
    }

    #[test]
    fn test_promote_then_lookup() {
        let dir = TempDir::new().unwrap();
        let shot = dir.path().join("home.png");
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])).save(&shot).unwrap();

        let status = execute_promote(&quiet(), &promote_args(dir.path(), shot, "tablet")).unwrap();
        assert_eq!(status, CommandStatus::Passed);

        let lookup = BaselineArgs {
            test: "home".into(),
            viewport: "tablet".into(),
            root: root(dir.path()),
        };
        assert_eq!(execute_baseline(&quiet(), &lookup).unwrap(), CommandStatus::Passed);
        assert!(BaselineStore::new(dir.path().join("baselines"))
            .find("home", &Viewport::Tablet)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_promote_missing_source() {
        let dir = TempDir::new().unwrap();
        let args = promote_args(dir.path(), dir.path().join("nope.png"), "desktop");
        let err = execute_promote(&quiet(), &args).unwrap_err();
        assert!(matches!(
            err,
            CliError::Shotdiff(ShotdiffError::PromotionSourceMissing { .. })
        ));
    }

    #[test]
    fn test_promote_bad_viewport() {
        let dir = TempDir::new().unwrap();
        let args = promote_args(dir.path(), dir.path().join("x.png"), "no/pe");
        assert!(matches!(
            execute_promote(&quiet(), &args),
            Err(CliError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_baseline_missing_fails() {
        let dir = TempDir::new().unwrap();
        let lookup = BaselineArgs {
            test: "home".into(),
            viewport: "desktop".into(),
            root: root(dir.path()),
        };
        assert_eq!(execute_baseline(&quiet(), &lookup).unwrap(), CommandStatus::Failed);
    }

    #[test]
    fn test_baselines_on_empty_store() {
        let dir = TempDir::new().unwrap();
        let args = BaselinesArgs {
            root: root(dir.path()),
            format: FormatArg::Json,
        };
        assert_eq!(execute_baselines(&quiet(), &args).unwrap(), CommandStatus::Passed);
    }
}
