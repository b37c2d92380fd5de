//! Pipeline orchestrator
//!
//! Drives the check chain over one file and performs the terminal action:
//!
//! - check fault: one `validator_error` ledger record, file left in place
//! - validation failure: every issue from the failing check goes to the ledger,
//!   then the file moves to `<rejected>/<today>/`
//! - success: digest marked seen, then the file moves to
//!   `<archive>/<filename date>/`. If the digest turns out to be recorded
//!   already, the file is rejected as a duplicate instead.
//!
//! The seen-store is written before the move. A crash between the two leaves
//! the digest recorded and the file in the source folder, so a resubmission
//! can never be accepted twice.

use crate::checks::{duplicate_file_issue, ChainFault, ChainVerdict, CheckChain, UNIQUENESS_RULE};
use crate::config::{PipelineConfig, StorageLayout, TrialgateConfig};
use crate::error::{PipelineError, Result};
use crate::tracker::SeenFileTracker;
use crate::types::{keys, FileOutcome, ValidationContext, ValidationIssue};
use chrono::{Datelike, Local, NaiveDate};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trialgate_ledger::ErrorLedger;

/// Rule recorded when a check fails internally.
pub const VALIDATOR_ERROR_RULE: &str = "validator_error";

pub struct Pipeline {
    chain: CheckChain,
    tracker: SeenFileTracker,
    ledger: ErrorLedger,
    layout: StorageLayout,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        chain: CheckChain,
        tracker: SeenFileTracker,
        ledger: ErrorLedger,
        layout: StorageLayout,
        config: PipelineConfig,
    ) -> Self {
        Self {
            chain,
            tracker,
            ledger,
            layout,
            config,
        }
    }

    /// Standard chain wired to the store and ledger named in `settings`.
    pub fn open(settings: &TrialgateConfig, config: PipelineConfig) -> Result<Self> {
        let tracker = SeenFileTracker::open(&settings.database_path)?;
        let ledger = ErrorLedger::open(&settings.ledger_path)?;
        let layout = settings.layout(&config);
        Ok(Self::new(
            CheckChain::standard(tracker.clone()),
            tracker,
            ledger,
            layout,
            config,
        ))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn tracker(&self) -> &SeenFileTracker {
        &self.tracker
    }

    /// Judge one file and carry out the outcome.
    ///
    /// `Err` is only returned for faults outside the chain (seen-store write,
    /// move); the caller counts those as invalid and moves on.
    pub fn process_file(&self, path: &Path) -> Result<FileOutcome> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| PipelineError::NoFileName(path.to_path_buf()))?;

        let mut context = ValidationContext::new();
        match self.chain.run(&filename, path, &mut context) {
            Err(fault) => Ok(self.on_fault(&filename, path, &context, fault)),
            Ok(ChainVerdict::Failed { check, issues }) => {
                self.on_failure(&filename, path, &context, check, issues)
            }
            Ok(ChainVerdict::Passed) => self.on_success(&filename, path, &context),
        }
    }

    fn on_fault(
        &self,
        filename: &str,
        path: &Path,
        context: &ValidationContext,
        fault: ChainFault,
    ) -> FileOutcome {
        let message = format!("validator exception in {}: {}", fault.check, fault.error);
        warn!(file = %filename, check = fault.check, error = %fault.error, "Check failed internally; leaving file in place");
        let meta = context.snapshot();
        self.record(filename, VALIDATOR_ERROR_RULE, &message, None, path, Some(&meta));

        FileOutcome::Errored {
            check: fault.check,
            message,
        }
    }

    fn on_failure(
        &self,
        filename: &str,
        path: &Path,
        context: &ValidationContext,
        check: &'static str,
        issues: Vec<ValidationIssue>,
    ) -> Result<FileOutcome> {
        let meta = context.snapshot();
        for issue in &issues {
            self.record(filename, &issue.rule, &issue.message, issue.row, path, Some(&meta));
        }

        let moved_to = if self.config.moves_files() {
            let dir = bucket_dir(&self.layout.rejected_root, Local::now().date_naive());
            Some(move_into(path, &dir, filename)?)
        } else {
            None
        };

        info!(file = %filename, check, issues = issues.len(), dest = ?moved_to, "Rejected");
        Ok(FileOutcome::Rejected {
            check,
            issues,
            moved_to,
        })
    }

    fn on_success(
        &self,
        filename: &str,
        path: &Path,
        context: &ValidationContext,
    ) -> Result<FileOutcome> {
        // Reuse the digest the uniqueness check computed so both always agree.
        let digest = match context.text(keys::SHA256) {
            Some(digest) => digest.to_string(),
            None => self.tracker.hash(path)?,
        };

        if self.config.writes_tracker() {
            let inserted = self.tracker.mark_seen(filename, &digest)?;
            debug!(file = %filename, digest = %digest, inserted, "Digest recorded");
            // Recorded between the uniqueness check and here.
            if !inserted {
                warn!(file = %filename, digest = %digest, "Digest already recorded; rejecting as duplicate");
                return self.on_failure(
                    filename,
                    path,
                    context,
                    UNIQUENESS_RULE,
                    vec![duplicate_file_issue()],
                );
            }
        }

        let archived_to = if self.config.moves_files() {
            let date = context
                .datetime(keys::FILENAME_DATETIME)
                .map(|dt| dt.date())
                .unwrap_or_else(|| Local::now().date_naive());
            let dir = bucket_dir(&self.layout.archive_root, date);
            Some(move_into(path, &dir, filename)?)
        } else {
            None
        };

        info!(file = %filename, digest = %digest, dest = ?archived_to, "Accepted");
        Ok(FileOutcome::Accepted {
            digest,
            archived_to,
        })
    }

    /// Ledger writes never change a file's outcome.
    fn record(
        &self,
        filename: &str,
        rule: &str,
        message: &str,
        row: Option<u64>,
        path: &Path,
        meta: Option<&Map<String, Value>>,
    ) {
        if let Err(err) = self
            .ledger
            .emit(filename, rule, message, row, Some(path), meta)
        {
            warn!(file = %filename, rule, error = %err, "Failed to write ledger record");
        }
    }
}

/// `<root>/<YYYY>/<MM>/<DD>`
pub fn bucket_dir(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
        .join(format!("{:02}", date.day()))
}

/// Move `path` into `dir` under `filename`, creating `dir` as needed.
///
/// Falls back to copy + remove when a rename is not possible (e.g. across
/// filesystems).
fn move_into(path: &Path, dir: &Path, filename: &str) -> Result<PathBuf> {
    let dest = dir.join(filename);
    let wrap = |source: io::Error| PipelineError::Move {
        from: path.to_path_buf(),
        to: dest.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(wrap)?;
    if let Err(err) = fs::rename(path, &dest) {
        debug!(from = %path.display(), to = %dest.display(), error = %err, "rename failed, copying");
        fs::copy(path, &dest).map_err(wrap)?;
        fs::remove_file(path).map_err(wrap)?;
    }
    Ok(dest)
}
