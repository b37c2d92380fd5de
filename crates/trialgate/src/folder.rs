//! Folder processor: runs the pipeline once per regular file in a directory.

use crate::error::{PipelineError, Result};
use crate::pipeline::Pipeline;
use crate::types::{FileOutcome, RunSummary};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span};
use trialgate_ids::RunId;

/// What happened to one file in a folder run.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub filename: String,
    pub result: Result<FileOutcome>,
}

impl FileReport {
    pub fn accepted(&self) -> bool {
        matches!(&self.result, Ok(outcome) if outcome.is_accepted())
    }
}

#[derive(Debug)]
pub struct FolderRun {
    pub run_id: RunId,
    pub reports: Vec<FileReport>,
    pub summary: RunSummary,
}

/// Regular files directly inside `source`, sorted by path.
pub fn list_candidates(source: &Path) -> Result<Vec<PathBuf>> {
    if !source.is_dir() {
        return Err(PipelineError::SourceMissing(source.to_path_buf()));
    }

    let read_err = |source_err| PipelineError::SourceRead {
        path: source.to_path_buf(),
        source: source_err,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(source).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Process every candidate in `source`, strictly one after another.
///
/// A single file's fault is logged and counted invalid; it never aborts the
/// batch. Only an unreadable source directory fails the whole run.
pub fn process_folder(pipeline: &Pipeline, source: &Path) -> Result<FolderRun> {
    let run_id = RunId::new();
    let span = info_span!("process_folder", run_id = %run_id, source = %source.display());
    let _guard = span.enter();

    let files = list_candidates(source)?;
    info!(files = files.len(), dry_run = pipeline.config().dry_run, no_move = pipeline.config().no_move, "Processing folder");

    let mut summary = RunSummary::default();
    let mut reports = Vec::with_capacity(files.len());

    for path in files {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let result = pipeline.process_file(&path);
        if let Err(err) = &result {
            error!(file = %filename, error = %err, "File processing failed");
        }

        let report = FileReport {
            path,
            filename,
            result,
        };
        summary.record(report.accepted());
        reports.push(report);
    }

    info!(total = summary.total, valid = summary.valid, invalid = summary.invalid, "Folder run complete");
    Ok(FolderRun {
        run_id,
        reports,
        summary,
    })
}
