//! Batch command - process many documents into one record set.

use std::path::PathBuf;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use docrec_core::Pipeline;

use super::{check_report, load_config, print_summary, write_output, OutputArgs};

/// Extensions the file backend understands.
const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "json", "txt", "text"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching the input documents
    #[arg(required = true)]
    input: String,

    #[command(flatten)]
    output: OutputArgs,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let files = collect_inputs(&args.input)?;

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut pipeline = Pipeline::with_file_backend(config).with_parser(args.output.parser.0);
    let result = pipeline.process_many_with(&files, |path| {
        debug!("Finished {}", path.display());
        progress.inc(1);
    });
    progress.finish_and_clear();

    let report = result?;
    write_output(&report, &args.output)?;
    print_summary(&report);
    check_report(&report)
}

/// Expand the glob, keeping files with a supported extension, sorted.
fn collect_inputs(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .filter(|path| {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .collect();

    files.sort();
    Ok(files)
}
