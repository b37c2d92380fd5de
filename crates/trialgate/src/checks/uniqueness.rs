//! Content uniqueness against the seen-file store.

use super::Check;
use crate::error::CheckError;
use crate::tracker::SeenFileTracker;
use crate::types::{keys, ContextUpdates, ValidationContext, ValidationIssue, ValidationResult};
use std::path::Path;

pub(crate) const UNIQUENESS_RULE: &str = "file_uniqueness";

/// Raised for content whose digest is already in the store.
pub(crate) fn duplicate_file_issue() -> ValidationIssue {
    ValidationIssue::file(UNIQUENESS_RULE, "duplicate file (sha256)")
}

/// Rejects files whose digest was already accepted. Publishes the digest
/// either way so the pipeline and ledger reuse it.
pub struct UniquenessCheck {
    tracker: SeenFileTracker,
}

impl UniquenessCheck {
    pub fn new(tracker: SeenFileTracker) -> Self {
        Self { tracker }
    }
}

impl Check for UniquenessCheck {
    fn name(&self) -> &'static str {
        UNIQUENESS_RULE
    }

    fn validate(
        &self,
        _filename: &str,
        path: &Path,
        _context: &ValidationContext,
    ) -> Result<ValidationResult, CheckError> {
        let digest = self.tracker.hash(path)?;
        let seen = self.tracker.is_seen(&digest)?;

        let mut updates = ContextUpdates::new();
        updates.insert(keys::SHA256.to_string(), digest.into());

        if seen {
            return Ok(ValidationResult::fail(duplicate_file_issue()).with_updates(updates));
        }
        Ok(ValidationResult::pass_with(updates))
    }
}
