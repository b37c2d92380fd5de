//! Error types for the validation pipeline

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Infrastructure fault raised from inside a check.
///
/// A check that finds bad data returns issues, not an error. `CheckError`
/// means the check could not finish at all.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Hash error: {0}")]
    Hash(#[from] trialgate_hash::HashError),

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

/// Seen-file tracker errors.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Database error: {0}")]
    Database(#[from] trialgate_db::BackendError),

    #[error("Hash error: {0}")]
    Hash(#[from] trialgate_hash::HashError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Faults that stop a single file (or a whole folder run) outside the check chain.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] trialgate_ledger::LedgerError),

    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Source directory not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Failed to list {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Path has no file name: {0}")]
    NoFileName(PathBuf),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PipelineError>;
