//! Shotdiff CLI Library
//!
//! Command-line interface for the Shotdiff visual regression engine.

#![warn(missing_docs)]
#![allow(clippy::format_push_string)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{
    BaselineArgs, BaselinesArgs, Cli, ColorArg, Commands, CompareArgs, FormatArg, PromoteArgs,
    RootArg, RunArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use handlers::CommandStatus;
pub use output::{describe_result, OutputFormat, ProgressObserver, ProgressReporter};
