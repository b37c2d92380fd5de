//! Sample data generator for smoke-testing an installation.

use crate::checks::EXPECTED_HEADERS;
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SAMPLE_ROWS: u32 = 5;
const READINGS: usize = 10;

/// `MED_DATA_<local now>.csv`
pub fn default_sample_name() -> String {
    format!("MED_DATA_{}.csv", Local::now().format("%Y%m%d%H%M%S"))
}

/// Write a file that passes every check to `dir/name`.
///
/// Rows carry batch ids `1..=5`, timestamp `12:00:00`, and readings of
/// `batch_id * 0.1`.
pub fn generate_sample(dir: &Path, name: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(EXPECTED_HEADERS)?;
    for i in 1..=SAMPLE_ROWS {
        let reading = format!("{:.3}", f64::from(i) * 0.1);
        let mut row = vec![i.to_string(), "12:00:00".to_string()];
        row.extend(std::iter::repeat(reading).take(READINGS));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(path)
}
