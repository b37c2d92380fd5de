//! Core types for the validation pipeline

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use trialgate_db::DbTimestamp;

/// Context keys published by the standard checks.
pub mod keys {
    /// Raw 14-digit timestamp embedded in the filename
    pub const FILENAME_TIMESTAMP: &str = "filename_timestamp";
    /// Parsed filename timestamp; selects the archive bucket
    pub const FILENAME_DATETIME: &str = "filename_datetime";
    /// Hex SHA-256 of the file contents
    pub const SHA256: &str = "sha256";
}

/// One problem found by a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub rule: String,
    pub message: String,
    /// Record position in the file, header = 1. `None` for file-level issues.
    pub row: Option<u64>,
}

impl ValidationIssue {
    /// File-level issue (no row).
    pub fn file(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
            row: None,
        }
    }

    pub fn at_row(rule: &str, message: impl Into<String>, row: u64) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
            row: Some(row),
        }
    }
}

/// A single value stored in the [`ValidationContext`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Text(String),
    DateTime(NaiveDateTime),
}

impl From<String> for ContextValue {
    fn from(v: String) -> Self {
        ContextValue::Text(v)
    }
}

impl From<&str> for ContextValue {
    fn from(v: &str) -> Self {
        ContextValue::Text(v.to_string())
    }
}

impl From<NaiveDateTime> for ContextValue {
    fn from(v: NaiveDateTime) -> Self {
        ContextValue::DateTime(v)
    }
}

/// Key/value updates produced by one check.
pub type ContextUpdates = BTreeMap<String, ContextValue>;

/// Accumulating state threaded through the chain for one file.
///
/// Keys are kept sorted so snapshots are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationContext {
    values: BTreeMap<String, ContextValue>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn merge(&mut self, updates: ContextUpdates) {
        self.values.extend(updates);
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ContextValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn datetime(&self, key: &str) -> Option<NaiveDateTime> {
        match self.values.get(key) {
            Some(ContextValue::DateTime(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// JSON object view of the context, used as ledger metadata.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(key, value)| {
                let json = serde_json::to_value(value).unwrap_or(Value::Null);
                (key.clone(), json)
            })
            .collect()
    }
}

/// Outcome of one check invocation.
///
/// `issues` is empty exactly when the check passed.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
    pub updates: ContextUpdates,
}

impl ValidationResult {
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn pass_with(updates: ContextUpdates) -> Self {
        Self {
            issues: Vec::new(),
            updates,
        }
    }

    pub fn fail(issue: ValidationIssue) -> Self {
        Self::from_issues(vec![issue])
    }

    /// Passes if `issues` is empty, fails otherwise.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            issues,
            updates: ContextUpdates::new(),
        }
    }

    pub fn with_updates(mut self, updates: ContextUpdates) -> Self {
        self.updates = updates;
        self
    }

    pub fn ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// A content digest that has been accepted once.
#[derive(Debug, Clone, Serialize)]
pub struct SeenFileRecord {
    /// Last-known filename, informational only
    pub filename: String,
    pub sha256: String,
    pub first_seen: DbTimestamp,
}

/// Terminal state of one file after the pipeline ran.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// Every check passed; the digest is recorded as seen unless dry-run.
    Accepted {
        digest: String,
        archived_to: Option<PathBuf>,
    },
    /// A check reported issues. Only that check's issues are present.
    Rejected {
        check: &'static str,
        issues: Vec<ValidationIssue>,
        moved_to: Option<PathBuf>,
    },
    /// A check failed internally; the file was left where it was.
    Errored { check: &'static str, message: String },
}

impl FileOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FileOutcome::Accepted { .. })
    }
}

/// Counts reported after a folder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: u64,
    pub valid: u64,
    pub invalid: u64,
}

impl RunSummary {
    pub fn record(&mut self, accepted: bool) {
        self.total += 1;
        if accepted {
            self.valid += 1;
        } else {
            self.invalid += 1;
        }
    }

    /// True when any file was rejected or failed.
    pub fn has_failures(&self) -> bool {
        self.invalid > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_context_merge_overwrites_and_snapshots_sorted() {
        let mut ctx = ValidationContext::new();
        ctx.insert(keys::SHA256, "old");

        let mut updates = ContextUpdates::new();
        updates.insert(keys::SHA256.to_string(), "new".into());
        updates.insert(keys::FILENAME_TIMESTAMP.to_string(), "20240101120000".into());
        ctx.merge(updates);

        assert_eq!(ctx.text(keys::SHA256), Some("new"));
        let keys: Vec<String> = ctx.snapshot().keys().cloned().collect();
        assert_eq!(keys, vec!["filename_timestamp", "sha256"]);
    }

    #[test]
    fn test_datetime_snapshot_is_iso8601() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut ctx = ValidationContext::new();
        ctx.insert(keys::FILENAME_DATETIME, dt);

        assert_eq!(ctx.datetime(keys::FILENAME_DATETIME), Some(dt));
        assert_eq!(ctx.text(keys::FILENAME_DATETIME), None);
        assert_eq!(
            ctx.snapshot()[keys::FILENAME_DATETIME],
            Value::from("2024-01-01T12:00:00")
        );
    }

    #[test]
    fn test_result_ok_tracks_issues() {
        assert!(ValidationResult::pass().ok());
        assert!(ValidationResult::from_issues(Vec::new()).ok());
        assert!(!ValidationResult::fail(ValidationIssue::file("non_empty", "file is empty")).ok());
    }

    #[test]
    fn test_run_summary_counts() {
        let mut summary = RunSummary::default();
        summary.record(true);
        summary.record(false);
        summary.record(false);
        assert_eq!(
            summary,
            RunSummary {
                total: 3,
                valid: 1,
                invalid: 2
            }
        );
        assert!(summary.has_failures());
        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            serde_json::json!({"total": 3, "valid": 1, "invalid": 2})
        );
    }
}
