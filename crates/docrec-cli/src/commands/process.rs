//! Process command - extract records from a single document.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docrec_core::Pipeline;

use super::{check_report, load_config, print_summary, write_output, OutputArgs};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input document (PDF, pre-extracted JSON or text)
    #[arg(required = true)]
    input: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    info!("Processing file: {}", args.input.display());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    spinner.set_message(format!("Processing {}", args.input.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut pipeline = Pipeline::with_file_backend(config).with_parser(args.output.parser.0);
    let result = pipeline.process_one(&args.input);
    spinner.finish_and_clear();

    let report = result?;
    debug!("Run statistics: {:?}", pipeline.statistics());

    write_output(&report, &args.output)?;
    print_summary(&report);
    check_report(&report)
}
