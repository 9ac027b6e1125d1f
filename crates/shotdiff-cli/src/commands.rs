//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shotdiff: visual regression checks for UI screenshots
#[derive(Parser, Debug)]
#[command(name = "shotdiff")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures and errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// YAML file with regression settings
    #[arg(long, global = true, env = "SHOTDIFF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare every screenshot against its baseline
    Run(RunArgs),

    /// Compare two image files
    Compare(CompareArgs),

    /// Approve a screenshot as the baseline for a test and viewport
    Promote(PromoteArgs),

    /// Print the authoritative baseline for a test and viewport
    Baseline(BaselineArgs),

    /// List recorded baselines
    Baselines(BaselinesArgs),
}

/// Root directory shared by the store-backed commands
#[derive(Args, Debug, Clone, Default)]
pub struct RootArg {
    /// Directory holding screenshots/, baselines/ and comparisons/
    #[arg(long)]
    pub root: Option<PathBuf>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    #[command(flatten)]
    pub root: RootArg,

    /// Minimum similarity to pass (at most 1.0)
    #[arg(short, long, allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Promote screenshots that had no baseline
    #[arg(long)]
    pub accept_new: bool,

    /// Fail screenshots whose viewport cannot be inferred instead of assuming desktop
    #[arg(long)]
    pub strict_viewport: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,

    /// Skip writing the JSON report
    #[arg(long)]
    pub no_report: bool,
}

/// Arguments for the compare command
#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// Screenshot under test
    pub current: PathBuf,

    /// Reference image
    pub baseline: PathBuf,

    /// Minimum similarity to pass (at most 1.0)
    #[arg(short, long, allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Directory for the difference image
    #[arg(short, long, default_value = "comparisons")]
    pub out: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the promote command
#[derive(Parser, Debug)]
pub struct PromoteArgs {
    /// Screenshot to approve
    pub screenshot: PathBuf,

    /// Test name
    #[arg(long)]
    pub test: String,

    /// Viewport (desktop, tablet, mobile or a custom tag)
    #[arg(long)]
    pub viewport: String,

    #[command(flatten)]
    pub root: RootArg,
}

/// Arguments for the baseline command
#[derive(Parser, Debug)]
pub struct BaselineArgs {
    /// Test name
    pub test: String,

    /// Viewport (desktop, tablet, mobile or a custom tag)
    pub viewport: String,

    #[command(flatten)]
    pub root: RootArg,
}

/// Arguments for the baselines command
#[derive(Parser, Debug)]
pub struct BaselinesArgs {
    #[command(flatten)]
    pub root: RootArg,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON document on stdout
    Json,
}

/// Color choice argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}
