//! Compare command handler

use super::{resolve_config, CommandStatus};
use crate::commands::{CompareArgs, RootArg};
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{OutputFormat, ProgressReporter};
use shotdiff::Comparator;

/// Compare two files directly, outside any baseline store
pub fn execute_compare(cli: &CliConfig, args: &CompareArgs) -> CliResult<CommandStatus> {
    let threshold = resolve_config(cli, &RootArg::default(), args.threshold)?.threshold;

    let comparator = Comparator::new(&args.out);
    let result = comparator.compare(&args.current, &args.baseline, threshold);
    tracing::debug!(
        current = %args.current.display(),
        baseline = %args.baseline.display(),
        threshold,
        passed = result.passed,
        "compared files"
    );

    match OutputFormat::from(args.format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            let reporter = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet());
            let name = args
                .current
                .file_name()
                .map_or_else(|| args.current.display().to_string(), |n| n.to_string_lossy().into_owned());
            reporter.result(&name, &result);
            if cli.verbosity.is_verbose() {
                if let (Some(mean), Some(max)) = (result.mean_difference, result.max_difference) {
                    reporter.info(&format!("mean difference {mean:.3}, max difference {max:.0}"));
                }
            }
        }
    }

    Ok(CommandStatus::from_failed(result.is_failure()))
}
