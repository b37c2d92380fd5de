//! `trialgate process`: validate every file in a folder.

use crate::cli::error::HelpfulError;
use anyhow::Context;
use std::path::PathBuf;
use trialgate::{process_folder, Pipeline, PipelineConfig, RunSummary, TrialgateConfig};

#[derive(Debug)]
pub struct ProcessArgs {
    /// Folder to process; defaults to the configured incoming folder
    pub path: Option<PathBuf>,
    pub dry_run: bool,
    pub no_move: bool,
    pub archive_path: Option<PathBuf>,
    /// Print one ACCEPTED/REJECTED line per file
    pub verbose: bool,
}

/// Execute the process command and return the run summary.
///
/// The summary is printed as JSON on stdout; the caller maps
/// `invalid > 0` to a failing exit status.
pub fn run(settings: &TrialgateConfig, args: ProcessArgs) -> anyhow::Result<RunSummary> {
    settings
        .ensure_dirs()
        .context("Failed to create working directories")?;

    let source = args.path.unwrap_or_else(|| settings.incoming_dir.clone());
    if !source.exists() {
        return Err(HelpfulError::path_not_found(&source).into());
    }
    if !source.is_dir() {
        return Err(HelpfulError::not_a_directory(&source).into());
    }

    let config = PipelineConfig {
        dry_run: args.dry_run,
        no_move: args.no_move,
        archive_path: args.archive_path,
    };
    let pipeline = Pipeline::open(settings, config).context("Failed to open pipeline")?;
    let run = process_folder(&pipeline, &source)
        .with_context(|| format!("Failed to process {}", source.display()))?;

    if args.verbose {
        for report in &run.reports {
            let status = if report.accepted() { "ACCEPTED" } else { "REJECTED" };
            println!("{}: {}", status, report.filename);
        }
    }

    let json = serde_json::to_string_pretty(&run.summary).context("Failed to render summary")?;
    println!("{}", json);

    Ok(run.summary)
}
