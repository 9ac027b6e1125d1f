//! Shotdiff CLI: visual regression checks for UI screenshots
//!
//! ## Usage
//!
//! ```bash
//! shotdiff run                                   # compare visual_regression/screenshots
//! shotdiff run --threshold 0.98 --accept-new     # stricter, approve first-time screenshots
//! shotdiff compare current.png baseline.png      # one-off comparison
//! shotdiff promote shot.png --test home --viewport mobile
//! ```
//!
//! Exit codes: 0 when nothing regressed, 1 when a comparison failed or a
//! command errored.

use clap::Parser;
use shotdiff_cli::{handlers, Cli, CliConfig, CliResult, ColorChoice, CommandStatus, Commands, Verbosity};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(status) => status.exit_code(),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<CommandStatus> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match &cli.command {
        Commands::Run(args) => handlers::execute_run(&config, args),
        Commands::Compare(args) => handlers::execute_compare(&config, args),
        Commands::Promote(args) => handlers::execute_promote(&config, args),
        Commands::Baseline(args) => handlers::execute_baseline(&config, args),
        Commands::Baselines(args) => handlers::execute_baselines(&config, args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(color)
        .with_config_file(cli.config.clone())
}

/// Logs go to stderr; `RUST_LOG` overrides the level chosen by `-v`/`-q`
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
