//! Filename convention: `MED_DATA_<YYYYMMDDHHMMSS>.csv`

use super::Check;
use crate::error::CheckError;
use crate::types::{keys, ContextUpdates, ValidationContext, ValidationIssue, ValidationResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^MED_DATA_([0-9]{14})\.csv$").expect("filename pattern is valid")
});

/// Checks the naming convention and publishes the embedded timestamp.
pub struct FilenameCheck;

impl Check for FilenameCheck {
    fn name(&self) -> &'static str {
        "filename_format"
    }

    fn validate(
        &self,
        filename: &str,
        _path: &Path,
        _context: &ValidationContext,
    ) -> Result<ValidationResult, CheckError> {
        let Some(caps) = FILENAME_RE.captures(filename) else {
            return Ok(ValidationResult::fail(ValidationIssue::file(
                self.name(),
                "invalid filename format",
            )));
        };
        let stamp = &caps[1];

        let Some(datetime) = parse_stamp(stamp) else {
            return Ok(ValidationResult::fail(ValidationIssue::file(
                self.name(),
                "invalid datetime in filename",
            )));
        };

        let mut updates = ContextUpdates::new();
        updates.insert(keys::FILENAME_TIMESTAMP.to_string(), stamp.into());
        updates.insert(keys::FILENAME_DATETIME.to_string(), datetime.into());
        Ok(ValidationResult::pass_with(updates))
    }
}

/// Parse a 14-digit `YYYYMMDDHHMMSS` stamp into a calendar-valid datetime.
pub(crate) fn parse_stamp(stamp: &str) -> Option<NaiveDateTime> {
    if stamp.len() != 14 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let field = |range: std::ops::Range<usize>| stamp[range].parse::<u32>().ok();

    let year = stamp[0..4].parse::<i32>().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)?;
    let time = NaiveTime::from_hms_opt(field(8..10)?, field(10..12)?, field(12..14)?)?;
    Some(NaiveDateTime::new(date, time))
}
