//! Structural checks: the file exists with content, parses as CSV, carries the
//! expected header, and every data row has the right number of fields.

use super::{data_rows, open_csv, read_rows, Check, EXPECTED_HEADERS};
use crate::error::CheckError;
use crate::types::{ValidationContext, ValidationIssue, ValidationResult};
use std::fs;
use std::path::Path;

pub struct NonEmptyCheck;

impl Check for NonEmptyCheck {
    fn name(&self) -> &'static str {
        "non_empty"
    }

    fn validate(
        &self,
        _filename: &str,
        path: &Path,
        _context: &ValidationContext,
    ) -> Result<ValidationResult, CheckError> {
        if fs::metadata(path)?.len() == 0 {
            return Ok(ValidationResult::fail(ValidationIssue::file(
                self.name(),
                "file is empty",
            )));
        }
        Ok(ValidationResult::pass())
    }
}

/// Reads the first two records. Parser errors are reported as issues.
pub struct CsvParseCheck;

impl Check for CsvParseCheck {
    fn name(&self) -> &'static str {
        "csv_parse"
    }

    fn validate(
        &self,
        _filename: &str,
        path: &Path,
        _context: &ValidationContext,
    ) -> Result<ValidationResult, CheckError> {
        let reader = match open_csv(path) {
            Ok(reader) => reader,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => return Ok(self.parse_error(e)),
        };

        for record in reader.into_records().take(2) {
            if let Err(e) = record {
                return Ok(self.parse_error(e));
            }
        }
        Ok(ValidationResult::pass())
    }
}

impl CsvParseCheck {
    fn parse_error(&self, err: csv::Error) -> ValidationResult {
        ValidationResult::fail(ValidationIssue::file(
            self.name(),
            format!("CSV parse error: {err}"),
        ))
    }
}

pub struct HeaderCheck;

impl Check for HeaderCheck {
    fn name(&self) -> &'static str {
        "header_check"
    }

    fn validate(
        &self,
        _filename: &str,
        path: &Path,
        _context: &ValidationContext,
    ) -> Result<ValidationResult, CheckError> {
        let Some((_, header)) = read_rows(path)?.into_iter().next() else {
            return Ok(ValidationResult::fail(ValidationIssue::file(
                self.name(),
                "missing header",
            )));
        };

        if !header.iter().eq(EXPECTED_HEADERS.iter().copied()) {
            let message = format!("header mismatch: {}", list_repr(header.iter()));
            return Ok(ValidationResult::fail(ValidationIssue::file(
                self.name(),
                message,
            )));
        }
        Ok(ValidationResult::pass())
    }
}

pub struct RowShapeCheck;

impl Check for RowShapeCheck {
    fn name(&self) -> &'static str {
        "row_shape"
    }

    fn validate(
        &self,
        _filename: &str,
        path: &Path,
        _context: &ValidationContext,
    ) -> Result<ValidationResult, CheckError> {
        let mut issues = Vec::new();
        for (row, record) in data_rows(path)? {
            if record.len() != EXPECTED_HEADERS.len() {
                issues.push(ValidationIssue::at_row(
                    self.name(),
                    format!("row has {} cols", record.len()),
                    row,
                ));
            }
        }
        Ok(ValidationResult::from_issues(issues))
    }
}

/// Render fields as a bracketed, quoted list: `['a', 'b']`.
fn list_repr<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = fields
        .map(|field| {
            if field.contains('\'') && !field.contains('"') {
                format!("\"{field}\"")
            } else {
                format!("'{}'", field.replace('\\', "\\\\").replace('\'', "\\'"))
            }
        })
        .collect();
    format!("[{}]", quoted.join(", "))
}
