//! Trialgate - validation pipeline and dedup tracker for clinical-trial CSV drops
//!
//! Files dropped into an incoming folder are judged by an ordered chain of
//! checks. Accepted files are archived under the date embedded in their name
//! and their content digest is recorded so byte-identical resubmissions are
//! refused. Rejected files are moved under today's date and every issue is
//! appended to the error ledger.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │    Folder    │     │   Pipeline   │     │  CheckChain  │
//! │  processor   │────▶│ orchestrator │────▶│  (8 checks)  │
//! └──────────────┘     └──────┬───────┘     └──────────────┘
//!                             │
//!             ┌───────────────┼────────────────┐
//!             ▼               ▼                ▼
//!      ┌────────────┐  ┌────────────┐  ┌───────────────┐
//!      │   Ledger   │  │  Seen-file │  │ archive /     │
//!      │  (NDJSON)  │  │  (SQLite)  │  │ rejected dirs │
//!      └────────────┘  └────────────┘  └───────────────┘
//! ```

pub mod checks;
pub mod config;
pub mod error;
pub mod folder;
pub mod pipeline;
pub mod sample;
pub mod tracker;
pub mod types;

// Re-exports for convenience
pub use checks::{ChainVerdict, Check, CheckChain, EXPECTED_HEADERS};
pub use config::{PipelineConfig, StorageLayout, TrialgateConfig};
pub use error::{CheckError, ConfigError, PipelineError, Result, TrackerError};
pub use folder::{process_folder, FileReport, FolderRun};
pub use pipeline::{bucket_dir, Pipeline, VALIDATOR_ERROR_RULE};
pub use tracker::SeenFileTracker;
pub use types::{
    FileOutcome, RunSummary, SeenFileRecord, ValidationContext, ValidationIssue, ValidationResult,
};
