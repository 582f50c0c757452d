//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod export;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;

use docrec_core::{DocrecConfig, ParserKind, RunReport};

use export::OutputFormat;

/// Parser selection: `auto` detects per document.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParserChoice(pub Option<ParserKind>);

fn parse_parser_choice(value: &str) -> Result<ParserChoice, String> {
    if value.eq_ignore_ascii_case("auto") {
        return Ok(ParserChoice(None));
    }
    value.parse::<ParserKind>().map(|kind| ParserChoice(Some(kind)))
}

/// Output options shared by `process` and `batch`.
#[derive(Args)]
pub struct OutputArgs {
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Parser to use: auto, invoice, report or financial_report
    #[arg(short, long, default_value = "auto", value_parser = parse_parser_choice)]
    pub parser: ParserChoice,

    /// Process without writing any output
    #[arg(long)]
    pub dry_run: bool,

    /// Keep internal fields (those starting with `_`) in the output
    #[arg(long)]
    pub keep_internal: bool,
}

/// Load the configuration file given on the command line, or the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocrecConfig> {
    match config_path {
        Some(path) => Ok(DocrecConfig::from_file(Path::new(path))?),
        None => Ok(DocrecConfig::default()),
    }
}

/// Render the records and write them to the output file or stdout.
pub fn write_output(report: &RunReport, args: &OutputArgs) -> anyhow::Result<()> {
    if args.dry_run {
        eprintln!(
            "{} Dry run: {} records not written",
            style("ℹ").blue(),
            report.total_rows
        );
        return Ok(());
    }

    let rendered = export::render(&report.records, args.format, args.keep_internal)?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, rendered)?;
            eprintln!(
                "{} Wrote {} records to {}",
                style("✓").green(),
                report.total_rows,
                path.display()
            );
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Print the run summary to stderr.
pub fn print_summary(report: &RunReport) {
    eprintln!();
    eprintln!(
        "{} Processed {}/{} files in {:.2?}",
        style("✓").green(),
        report.files_succeeded,
        report.files_processed,
        report.elapsed
    );
    eprintln!(
        "   {} rows, {} errors, {} warnings, {} validation errors",
        style(report.total_rows).green(),
        style(report.errors).red(),
        style(report.warnings).yellow(),
        style(report.validation_errors).yellow()
    );

    if !report.issues.is_empty() {
        eprintln!();
        eprintln!("{}", style("Issues:").yellow());
        for issue in &report.issues {
            eprintln!("  - {}", issue);
        }
    }
}

/// Fail the command when any document could not be read.
pub fn check_report(report: &RunReport) -> anyhow::Result<()> {
    if !report.is_success() {
        anyhow::bail!("{} document(s) failed", report.errors);
    }
    Ok(())
}
