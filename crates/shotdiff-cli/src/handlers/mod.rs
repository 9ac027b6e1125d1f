//! Command handlers - extracted from main.rs for testability
//!
//! Each handler returns a [`CommandStatus`]; `main` turns it into the process
//! exit code.

pub mod baselines;
pub mod compare;
pub mod run;

pub use baselines::{execute_baseline, execute_baselines, execute_promote};
pub use compare::execute_compare;
pub use run::execute_run;

use crate::commands::RootArg;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use shotdiff::{RegressionConfig, Viewport};
use std::process::ExitCode;

/// Outcome of a command that completed without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Nothing regressed
    Passed,
    /// A comparison failed or a lookup came back empty
    Failed,
}

impl CommandStatus {
    /// `Failed` when `failed` is set
    #[must_use]
    pub const fn from_failed(failed: bool) -> Self {
        if failed {
            Self::Failed
        } else {
            Self::Passed
        }
    }

    /// Process exit code: 0 or 1
    #[must_use]
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Passed => ExitCode::SUCCESS,
            Self::Failed => ExitCode::from(1),
        }
    }
}

/// Regression settings: YAML file (if any), then `SHOTDIFF_ROOT` and
/// `SHOTDIFF_THRESHOLD`, then `--root`/`--threshold`
pub fn resolve_config(
    cli: &CliConfig,
    root: &RootArg,
    threshold: Option<f64>,
) -> CliResult<RegressionConfig> {
    let mut config = match &cli.config_file {
        Some(path) => RegressionConfig::from_yaml_file(path)?,
        None => RegressionConfig::default(),
    }
    .apply_env()?;
    if let Some(root) = &root.root {
        config = config.with_root(root);
    }
    if let Some(threshold) = threshold {
        config = config.with_threshold(threshold);
    }
    config.validate()?;
    tracing::debug!(
        root = %config.root.display(),
        threshold = config.threshold,
        "resolved regression config"
    );
    Ok(config)
}

/// Parse a viewport argument
pub fn parse_viewport(raw: &str) -> CliResult<Viewport> {
    raw.parse()
        .map_err(|e| CliError::invalid_argument(format!("viewport {raw:?}: {e}")))
}
