//! Per-cell value rules and batch id uniqueness within a file.
//!
//! Both checks run after the row-shape check, so every data record has
//! exactly one field per expected column. Fields are trimmed before parsing.

use super::{data_rows, Check, EXPECTED_HEADERS};
use crate::error::CheckError;
use crate::types::{ValidationContext, ValidationIssue, ValidationResult};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

/// Readings must be strictly below this bound.
pub const READING_UPPER_BOUND: f64 = 10.0;

/// Shape only: `25:00:00` is accepted.
static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}$").expect("timestamp pattern is valid"));

const BATCH_ID: usize = 0;
const TIMESTAMP: usize = 1;
const FIRST_READING: usize = 2;

pub struct ValueDomainCheck;

impl Check for ValueDomainCheck {
    fn name(&self) -> &'static str {
        "value_domain"
    }

    fn validate(
        &self,
        _filename: &str,
        path: &Path,
        _context: &ValidationContext,
    ) -> Result<ValidationResult, CheckError> {
        let rule = self.name();
        let mut issues = Vec::new();

        for (row, record) in data_rows(path)? {
            let field = |idx: usize| record.get(idx).unwrap_or("").trim();

            match field(BATCH_ID).parse::<i128>() {
                Ok(id) if id <= 0 => {
                    issues.push(ValidationIssue::at_row(rule, "batch_id not positive", row))
                }
                Ok(_) => {}
                Err(_) => issues.push(ValidationIssue::at_row(rule, "batch_id not integer", row)),
            }

            if !TIMESTAMP_RE.is_match(field(TIMESTAMP)) {
                issues.push(ValidationIssue::at_row(rule, "bad timestamp format", row));
            }

            for (idx, column) in EXPECTED_HEADERS.iter().enumerate().skip(FIRST_READING) {
                match field(idx).parse::<f64>() {
                    Ok(value) if value >= READING_UPPER_BOUND => issues.push(ValidationIssue::at_row(
                        rule,
                        format!("{column} out of range: {}", format_reading(value)),
                        row,
                    )),
                    Ok(_) => {}
                    Err(_) => {
                        issues.push(ValidationIssue::at_row(rule, format!("{column} not float"), row))
                    }
                }
            }
        }

        Ok(ValidationResult::from_issues(issues))
    }
}

/// Flags every repeat of a batch id already seen earlier in the file.
pub struct DuplicateBatchCheck;

impl Check for DuplicateBatchCheck {
    fn name(&self) -> &'static str {
        "duplicate_batch_id"
    }

    fn validate(
        &self,
        _filename: &str,
        path: &Path,
        _context: &ValidationContext,
    ) -> Result<ValidationResult, CheckError> {
        let mut seen = HashSet::new();
        let mut issues = Vec::new();

        for (row, record) in data_rows(path)? {
            let batch_id = record.get(BATCH_ID).unwrap_or("").trim().to_string();
            if seen.contains(&batch_id) {
                issues.push(ValidationIssue::at_row(
                    self.name(),
                    format!("duplicate batch_id: {batch_id}"),
                    row,
                ));
            } else {
                seen.insert(batch_id);
            }
        }

        Ok(ValidationResult::from_issues(issues))
    }
}

/// Whole numbers keep one decimal place (`10.0`), everything else prints as-is.
fn format_reading(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use tempfile::TempDir;

    fn run(c: &dyn Check, rows: &[String]) -> Vec<ValidationIssue> {
        let dir = TempDir::new().unwrap();
        let mut content = format!("{HEADER}\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        let path = write(&dir, "MED_DATA_20240101120000.csv", &content);
        c.validate("MED_DATA_20240101120000.csv", &path, &ValidationContext::new())
            .unwrap()
            .issues
    }

    fn row(batch_id: &str, timestamp: &str, reading1: &str) -> String {
        format!("{batch_id},{timestamp},{reading1},0.1,0.1,0.1,0.1,0.1,0.1,0.1,0.1,0.1")
    }

    #[test]
    fn test_valid_rows_pass() {
        assert!(run(&ValueDomainCheck, &[valid_row("1"), valid_row("2")]).is_empty());
    }

    #[test]
    fn test_batch_id_rules() {
        let issues = run(
            &ValueDomainCheck,
            &[row("0", "12:00:00", "0.1"), row("-3", "12:00:00", "0.1"), row("abc", "12:00:00", "0.1"), row("1.5", "12:00:00", "0.1")],
        );
        assert_eq!(
            issues,
            vec![
                ValidationIssue::at_row("value_domain", "batch_id not positive", 2),
                ValidationIssue::at_row("value_domain", "batch_id not positive", 3),
                ValidationIssue::at_row("value_domain", "batch_id not integer", 4),
                ValidationIssue::at_row("value_domain", "batch_id not integer", 5),
            ]
        );
    }

    #[test]
    fn test_timestamp_shape_only() {
        assert!(run(&ValueDomainCheck, &[row("1", "25:00:00", "0.1"), row("2", "99:99:99", "0.1")]).is_empty());

        let issues = run(&ValueDomainCheck, &[row("1", "1:00:00", "0.1"), row("2", "noon", "0.1")]);
        assert_eq!(
            issues,
            vec![
                ValidationIssue::at_row("value_domain", "bad timestamp format", 2),
                ValidationIssue::at_row("value_domain", "bad timestamp format", 3),
            ]
        );
    }

    #[test]
    fn test_reading_bounds() {
        let issues = run(
            &ValueDomainCheck,
            &[
                row("1", "12:00:00", "9.999"),
                row("2", "12:00:00", "10"),
                row("3", "12:00:00", "12.5"),
                row("4", "12:00:00", "-50"),
                row("5", "12:00:00", "high"),
            ],
        );
        assert_eq!(
            issues,
            vec![
                ValidationIssue::at_row("value_domain", "reading1 out of range: 10.0", 3),
                ValidationIssue::at_row("value_domain", "reading1 out of range: 12.5", 4),
                ValidationIssue::at_row("value_domain", "reading1 not float", 6),
            ]
        );
    }

    #[test]
    fn test_one_row_can_raise_several_issues() {
        let issues = run(&ValueDomainCheck, &["x,bad,11,0.1,0.1,0.1,0.1,0.1,0.1,0.1,0.1,".to_string()]);
        let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "batch_id not integer",
                "bad timestamp format",
                "reading1 out of range: 11.0",
                "reading10 not float",
            ]
        );
        assert!(issues.iter().all(|i| i.row == Some(2)));
    }

    #[test]
    fn test_fields_are_trimmed() {
        assert!(run(&ValueDomainCheck, &[row(" 7 ", " 12:00:00", " 1.5 ")]).is_empty());
    }

    #[test]
    fn test_duplicate_batch_ids() {
        let issues = run(
            &DuplicateBatchCheck,
            &[valid_row("1"), valid_row("2"), valid_row("1"), valid_row(" 1"), valid_row("2")],
        );
        assert_eq!(
            issues,
            vec![
                ValidationIssue::at_row("duplicate_batch_id", "duplicate batch_id: 1", 4),
                ValidationIssue::at_row("duplicate_batch_id", "duplicate batch_id: 1", 5),
                ValidationIssue::at_row("duplicate_batch_id", "duplicate batch_id: 2", 6),
            ]
        );
    }

    #[test]
    fn test_distinct_batch_ids_pass() {
        assert!(run(&DuplicateBatchCheck, &[valid_row("1"), valid_row("2"), valid_row("3")]).is_empty());
    }

    #[test]
    fn test_format_reading() {
        assert_eq!(format_reading(10.0), "10.0");
        assert_eq!(format_reading(12.5), "12.5");
        assert_eq!(format_reading(f64::INFINITY), "inf");
    }
}
