//! Configuration for Trialgate
//!
//! `TrialgateConfig` describes where things live on disk and is read from a
//! TOML file. `PipelineConfig` carries the per-run switches.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory and store locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialgateConfig {
    /// Folder scanned by `process` when no `--path` is given
    #[serde(default = "default_incoming_dir")]
    pub incoming_dir: PathBuf,

    /// Root of the date-bucketed archive for accepted files
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Root of the date-bucketed rejected area
    #[serde(default = "default_rejected_dir")]
    pub rejected_dir: PathBuf,

    /// NDJSON error ledger
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// SQLite seen-file store
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_sample_dir")]
    pub sample_dir: PathBuf,

    /// Operational (tracing) logs
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_incoming_dir() -> PathBuf {
    PathBuf::from("data/incoming")
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("data/archive")
}

fn default_rejected_dir() -> PathBuf {
    PathBuf::from("data/rejected")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("logs/errors.jsonl")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("app/seen.db")
}

fn default_sample_dir() -> PathBuf {
    PathBuf::from("samples")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for TrialgateConfig {
    fn default() -> Self {
        Self {
            incoming_dir: default_incoming_dir(),
            archive_dir: default_archive_dir(),
            rejected_dir: default_rejected_dir(),
            ledger_path: default_ledger_path(),
            database_path: default_database_path(),
            sample_dir: default_sample_dir(),
            log_dir: default_log_dir(),
        }
    }
}

impl TrialgateConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Create every directory a run writes into.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        let parents = [self.ledger_path.parent(), self.database_path.parent()];
        let dirs = [
            Some(self.incoming_dir.as_path()),
            Some(self.archive_dir.as_path()),
            Some(self.rejected_dir.as_path()),
        ];

        for dir in dirs.into_iter().chain(parents).flatten() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }

    /// Destination roots for this run.
    pub fn layout(&self, pipeline: &PipelineConfig) -> StorageLayout {
        StorageLayout {
            archive_root: pipeline
                .archive_path
                .clone()
                .unwrap_or_else(|| self.archive_dir.clone()),
            rejected_root: self.rejected_dir.clone(),
        }
    }
}

/// Per-run switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Validate and write the ledger, but leave the seen-store and files alone
    pub dry_run: bool,
    /// Skip only the filesystem move
    pub no_move: bool,
    /// Overrides the configured archive root
    pub archive_path: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn writes_tracker(&self) -> bool {
        !self.dry_run
    }

    pub fn moves_files(&self) -> bool {
        !self.dry_run && !self.no_move
    }
}

/// Where accepted and rejected files end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub archive_root: PathBuf,
    pub rejected_root: PathBuf,
}
