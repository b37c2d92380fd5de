//! Append-only error ledger for Trialgate validation runs.
//!
//! Every validation issue becomes one [`LedgerRecord`], written as a single
//! JSON object per line (NDJSON). The ledger is a pure write sink: there is no
//! read-back, deduplication, or rotation here.
//!
//! # Example
//!
//! ```no_run
//! use trialgate_ledger::ErrorLedger;
//! use std::path::Path;
//!
//! let ledger = ErrorLedger::open(Path::new("logs/errors.jsonl")).unwrap();
//! ledger.emit(
//!     "MED_DATA_20240101120000.csv",
//!     "value_domain",
//!     "reading3 out of range: 10.0",
//!     Some(2),
//!     Some(Path::new("data/incoming/MED_DATA_20240101120000.csv")),
//!     None,
//! ).unwrap();
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;
use trialgate_ids::LedgerRecordId;

/// Errors that can occur while appending to the ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to acquire lock")]
    LockError,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// One validation issue as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Time-ordered unique identifier for this record
    pub guid: LedgerRecordId,
    pub filename: String,
    /// Content digest of the file; `None` when hashing failed or no path was given
    pub sha256: Option<String>,
    pub rule: String,
    pub message: String,
    /// Record position in the file (header is record 1)
    pub row: Option<u64>,
    pub occurred_at: DateTime<Utc>,
    /// Snapshot of the validation context when the issue was recorded
    pub meta: Map<String, Value>,
}

/// Writer for the NDJSON error ledger.
///
/// The file is opened in append mode; existing records are never rewritten.
pub struct ErrorLedger {
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
}

impl ErrorLedger {
    /// Open (or create) the ledger at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record to the ledger.
    ///
    /// When `source_path` is given the record's digest is computed from it. A
    /// hashing failure leaves `sha256` null; the record is still written.
    ///
    /// Returns the identifier of the written record.
    pub fn emit(
        &self,
        filename: &str,
        rule: &str,
        message: &str,
        row: Option<u64>,
        source_path: Option<&Path>,
        meta: Option<&Map<String, Value>>,
    ) -> Result<LedgerRecordId> {
        let sha256 = source_path.and_then(|path| match trialgate_hash::sha256_file(path) {
            Ok(digest) => Some(digest),
            Err(err) => {
                warn!(file = %filename, error = %err, "Ledger digest unavailable");
                None
            }
        });

        let record = LedgerRecord {
            guid: LedgerRecordId::new(),
            filename: filename.to_string(),
            sha256,
            rule: rule.to_string(),
            message: message.to_string(),
            row,
            occurred_at: Utc::now(),
            meta: meta.cloned().unwrap_or_default(),
        };

        self.append(&record)?;
        Ok(record.guid)
    }

    /// Append a fully formed record.
    pub fn append(&self, record: &LedgerRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;

        let mut file = self.file.lock().map_err(|_| LedgerError::LockError)?;
        writeln!(file, "{}", json)?;
        file.flush()?;

        Ok(())
    }
}
