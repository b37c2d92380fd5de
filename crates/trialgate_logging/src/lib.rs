//! Operational logging for the trialgate binary.
//!
//! Only `tracing` output goes through here. Validation failures belong to the
//! error ledger, which is append-only and never rotated.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "trialgate=info,trialgate_ledger=info,trialgate_db=warn";
/// Daily files kept in the log directory.
const MAX_LOG_FILES: usize = 5;

pub struct LogConfig<'a> {
    /// File prefix: `<app_name>.<date>.log`
    pub app_name: &'a str,
    /// Mirror the file filter on stderr instead of showing warnings only
    pub verbose: bool,
    pub log_dir: &'a Path,
}

/// Install the global subscriber: a daily-rotated file in `log_dir` plus
/// stderr. `RUST_LOG` overrides the default filter.
///
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init_logging(config: LogConfig<'_>) -> Result<WorkerGuard> {
    let appender = file_appender(config.log_dir, config.app_name)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        file_filter.clone()
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        // stdout carries the run summary, so console logs stay on stderr.
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

fn file_appender(log_dir: &Path, app_name: &str) -> Result<RollingFileAppender> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create logs directory: {}", log_dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(sanitize_name(app_name))
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(log_dir)
        .with_context(|| format!("Failed to open log file in {}", log_dir.display()))
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
