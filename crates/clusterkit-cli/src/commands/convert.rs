use crate::cli::ConvertArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use clusterkit::workflows::convert::{self, BatchReport};
use clusterkit::workflows::progress::ProgressReporter;
use tracing::{debug, error, info, warn};

pub fn run(args: ConvertArgs, config: &PartialConfig) -> Result<()> {
    let options = config.merge_convert(&args);
    debug!("Resolved conversion options: {:?}", options);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let report = convert::run(&args.input, &args.output, &options, &reporter)?;
    summarize(&report)
}

fn summarize(report: &BatchReport) -> Result<()> {
    if report.total() == 0 {
        warn!("No matching input files were found.");
        println!("No matching input files were found.");
        return Ok(());
    }

    for outcome in report.failures() {
        if let Err(e) = &outcome.result {
            error!("Failed to convert '{}': {}", outcome.input.display(), e);
            eprintln!("Error: {}", e);
        }
    }

    info!(
        "Converted {} of {} file(s)",
        report.succeeded(),
        report.total()
    );

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::BatchFailed {
            failed: report.failed(),
            total: report.total(),
        })
    }
}
