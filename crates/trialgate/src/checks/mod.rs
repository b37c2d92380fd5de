//! Validation checks and the ordered chain that runs them.
//!
//! Each check implements [`Check`] and sees the raw file plus the context
//! published by the checks before it. The chain stops at the first check that
//! reports issues, so a check may rely on every earlier check having passed
//! (the row-shape check assumes a header exists, the value-domain check
//! assumes every row has 12 fields, and so on).
//!
//! Standard order:
//!
//! 1. `filename_format`
//! 2. `non_empty`
//! 3. `csv_parse`
//! 4. `header_check`
//! 5. `row_shape`
//! 6. `value_domain`
//! 7. `duplicate_batch_id`
//! 8. `file_uniqueness`

mod filename;
mod structure;
mod uniqueness;
mod values;

pub use filename::FilenameCheck;
pub use structure::{CsvParseCheck, HeaderCheck, NonEmptyCheck, RowShapeCheck};
pub use uniqueness::UniquenessCheck;
pub(crate) use uniqueness::{duplicate_file_issue, UNIQUENESS_RULE};
pub use values::{DuplicateBatchCheck, ValueDomainCheck};

use crate::error::CheckError;
use crate::tracker::SeenFileTracker;
use crate::types::{ValidationContext, ValidationIssue, ValidationResult};
use csv::StringRecord;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Column names every data file must carry, in order.
pub const EXPECTED_HEADERS: [&str; 12] = [
    "batch_id",
    "timestamp",
    "reading1",
    "reading2",
    "reading3",
    "reading4",
    "reading5",
    "reading6",
    "reading7",
    "reading8",
    "reading9",
    "reading10",
];

/// One independent validation step.
pub trait Check {
    /// Rule identifier written to the ledger.
    fn name(&self) -> &'static str;

    /// Inspect the file. Bad data is reported through the returned issues;
    /// `Err` means the check itself could not run.
    fn validate(
        &self,
        filename: &str,
        path: &Path,
        context: &ValidationContext,
    ) -> Result<ValidationResult, CheckError>;
}

/// How a file fared against the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainVerdict {
    Passed,
    Failed {
        check: &'static str,
        issues: Vec<ValidationIssue>,
    },
}

/// A check that raised instead of reporting.
#[derive(Debug)]
pub struct ChainFault {
    pub check: &'static str,
    pub error: CheckError,
}

/// Ordered list of checks with short-circuit semantics.
pub struct CheckChain {
    checks: Vec<Box<dyn Check>>,
}

impl CheckChain {
    pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks }
    }

    /// The eight standard checks in their required order.
    pub fn standard(tracker: SeenFileTracker) -> Self {
        Self::new(vec![
            Box::new(FilenameCheck),
            Box::new(NonEmptyCheck),
            Box::new(CsvParseCheck),
            Box::new(HeaderCheck),
            Box::new(RowShapeCheck),
            Box::new(ValueDomainCheck),
            Box::new(DuplicateBatchCheck),
            Box::new(UniquenessCheck::new(tracker)),
        ])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|check| check.name()).collect()
    }

    /// Run checks in order until one reports issues.
    ///
    /// Context updates from every executed check, including the failing one,
    /// are merged into `context`.
    pub fn run(
        &self,
        filename: &str,
        path: &Path,
        context: &mut ValidationContext,
    ) -> Result<ChainVerdict, ChainFault> {
        for check in &self.checks {
            let result = check
                .validate(filename, path, context)
                .map_err(|error| ChainFault {
                    check: check.name(),
                    error,
                })?;

            let ok = result.ok();
            context.merge(result.updates);
            if !ok {
                debug!(file = %filename, check = check.name(), issues = result.issues.len(), "check failed");
                return Ok(ChainVerdict::Failed {
                    check: check.name(),
                    issues: result.issues,
                });
            }
        }
        Ok(ChainVerdict::Passed)
    }
}

/// Headerless, flexible CSV reader: every line is a record and field counts
/// may vary, so shape problems are reported by the checks rather than the
/// parser.
fn open_csv(path: &Path) -> Result<csv::Reader<File>, csv::Error> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
}

/// Every row of the file, numbered from 1.
///
/// The parser drops blank lines, but a blank line is still a row here: it
/// comes back as an empty record so numbering matches the line the operator
/// sees and `row_shape` can report it as `row has 0 cols`.
fn read_rows(path: &Path) -> Result<Vec<(u64, StringRecord)>, csv::Error> {
    let bytes = fs::read(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    let mut consumed = 0usize;
    loop {
        let more = reader.read_record(&mut record)?;
        for _ in 0..leading_blank_lines(&bytes, consumed) {
            rows.push(StringRecord::new());
        }
        consumed = reader.position().byte() as usize;
        if !more {
            break;
        }
        rows.push(record.clone());
    }
    Ok((1u64..).zip(rows).collect())
}

/// Data rows only (header = row 1, first data row = 2).
fn data_rows(path: &Path) -> Result<impl Iterator<Item = (u64, StringRecord)>, csv::Error> {
    Ok(read_rows(path)?.into_iter().skip(1))
}

/// Empty lines starting at `start`. `\n`, `\r` and `\r\n` each end one line.
fn leading_blank_lines(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    // A record may stop after the `\r` of its own CRLF terminator.
    if i > 0 && i < bytes.len() && bytes[i - 1] == b'\r' && bytes[i] == b'\n' {
        i += 1;
    }

    let mut blanks = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => i += 2,
            b'\r' | b'\n' => i += 1,
            _ => break,
        }
        blanks += 1;
    }
    blanks
}
