//! Oval extraction CLI
//!
//! `extract` runs the pipeline over an index range; `inspect` decodes one
//! persisted ellipse record.

use super::config::CliConfigBuilder;
use crate::{
    codec,
    config::{ExtractionConfig, DEFAULT_CONFIG_FILE},
    error::ErrorKind,
    parallel::{default_concurrency, run_parallel},
    services::{create_cli_progress_reporter, ImageIOService, ProgressReporter},
    tracing_config::{init_cli_tracing, spans},
    worker,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Instrument};

/// Number of failed indices printed before the list is cut short
const FAILED_PREVIEW_LEN: usize = 10;

/// Face oval extraction from skin segmentation masks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "oval-annotate")]
pub struct Cli {
    /// Path to YAML config file
    #[arg(long, value_name = "CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Number of parallel workers (overrides config; default: all CPUs)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log progress as plain lines instead of drawing a progress bar
    #[arg(long, global = true)]
    pub no_progress: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract oval annotations from skin masks
    Extract(ExtractArgs),
    /// Print a stored oval annotation as JSON
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExtractArgs {
    /// First image index (inclusive)
    #[arg(long, value_name = "N")]
    pub start: Option<usize>,

    /// Last image index (exclusive)
    #[arg(long, value_name = "N")]
    pub end: Option<usize>,

    /// Save binary oval mask PNGs
    #[arg(long)]
    pub save_masks: bool,

    /// Save original images with the oval drawn on them
    #[arg(long)]
    pub save_overlays: bool,

    /// Override paths.image_dir
    #[arg(long, value_name = "DIR")]
    pub image_dir: Option<PathBuf>,

    /// Override paths.mask_dir
    #[arg(long, value_name = "DIR")]
    pub mask_dir: Option<PathBuf>,

    /// Override paths.output_dir
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Image index of the record
    #[arg(long, value_name = "N")]
    pub index: usize,

    /// Override paths.output_dir
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// What an `extract` run produced
#[derive(Debug, Clone)]
pub struct ExtractReport {
    pub succeeded: usize,
    /// Failed indices, ascending
    pub failed: Vec<usize>,
    pub failures_by_kind: BTreeMap<ErrorKind, usize>,
    /// Set when at least one item failed
    pub failed_log: Option<PathBuf>,
    pub summary_path: PathBuf,
}

/// Main entry point for CLI application
pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id = init_cli_tracing(cli.verbose, cli.no_progress)
        .context("Failed to initialize tracing")?;
    let command_name = match cli.command {
        Command::Extract(_) => "extract",
        Command::Inspect(_) => "inspect",
    };

    run(&cli)
        .instrument(spans::session(&session_id, command_name))
        .await
}

async fn run(cli: &Cli) -> Result<()> {
    let config = CliConfigBuilder::from_cli(cli).context("Failed to build configuration")?;
    match &cli.command {
        Command::Extract(_) => {
            let interactive = !cli.no_progress && std::io::stderr().is_terminal();
            let reporter = create_cli_progress_reporter(interactive, cli.verbose > 0);
            let report = run_extract(&config, reporter.as_ref()).await?;
            print_report(&report);
            Ok(())
        },
        Command::Inspect(args) => inspect(&config, args.index),
    }
}

/// Run the extraction pipeline over `[start, end)` and write the run artifacts
pub async fn run_extract(
    config: &ExtractionConfig,
    reporter: &dyn ProgressReporter,
) -> Result<ExtractReport> {
    let output_dir = &config.paths.output_dir;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let items = config.work_items();
    let workers = config.workers.unwrap_or_else(default_concurrency);

    println!(
        "Extracting ovals: images {}-{} ({} images, workers={})",
        config.processing.start,
        config.processing.end.saturating_sub(1),
        items.len(),
        config
            .workers
            .map_or_else(|| "all CPUs".to_string(), |n| n.to_string())
    );
    println!("Output dir: {}", output_dir.display());

    let outcome = run_parallel(items, Arc::new(worker::process), Some(workers), reporter)
        .instrument(spans::batch(
            config.processing.start,
            config.processing.end,
            workers,
        ))
        .await
        .context("Extraction batch could not run")?;

    let failed = outcome.failed_indices();
    let failed_log = if failed.is_empty() {
        None
    } else {
        Some(
            ImageIOService::write_failed_log(output_dir, &failed)
                .context("Failed to write failure log")?,
        )
    };

    let summary_path = ImageIOService::write_summary(output_dir, &outcome.successes)
        .context("Failed to write summary")?;

    info!(
        succeeded = outcome.successes.len(),
        failed = failed.len(),
        "Extraction finished"
    );

    Ok(ExtractReport {
        succeeded: outcome.successes.len(),
        failures_by_kind: outcome.failures_by_kind(),
        failed,
        failed_log,
        summary_path,
    })
}

/// Console line listing failed indices, cut to the first ten
#[must_use]
pub fn failed_preview(failed: &[usize]) -> String {
    if failed.len() <= FAILED_PREVIEW_LEN {
        format!("Failed: {failed:?}")
    } else {
        format!(
            "First {FAILED_PREVIEW_LEN} failed: {:?}",
            &failed[..FAILED_PREVIEW_LEN]
        )
    }
}

fn print_report(report: &ExtractReport) {
    let rule = "=".repeat(55);
    println!("\n{rule}");
    println!(
        "COMPLETE - {} succeeded, {} failed",
        report.succeeded,
        report.failed.len()
    );
    println!("{rule}");

    if let Some(path) = &report.failed_log {
        for (kind, count) in &report.failures_by_kind {
            println!("  {kind}: {count}");
        }
        println!("Failed indices saved to: {}", path.display());
        println!("{}", failed_preview(&report.failed));
    }
    println!("Summary saved to: {}", report.summary_path.display());
}

fn inspect(config: &ExtractionConfig, index: usize) -> Result<()> {
    let path = codec::record_path(&config.paths.output_dir, index);
    let descriptor = match codec::load_record(&path) {
        Ok(descriptor) => descriptor,
        Err(e) if e.kind() == ErrorKind::NotFound => bail!(
            "No oval record for image {index} at {}. \
             Run `oval-annotate extract --start {index} --end {}` first.",
            path.display(),
            index.saturating_add(1)
        ),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        },
    };

    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}
