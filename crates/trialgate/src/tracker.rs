//! Seen-file tracker
//!
//! Persistent set of content digests that have been accepted. The SQLite
//! schema owns the uniqueness guarantee: `sha256` is `UNIQUE`, and inserts use
//! `INSERT OR IGNORE`, so repeated or concurrent runs cannot create a second
//! record for the same digest. Nothing is cached in memory between calls.

use crate::error::TrackerError;
use crate::types::SeenFileRecord;
use std::path::Path;
use tracing::debug;
use trialgate_db::{DbConnection, DbTimestamp, DbValue};

type Result<T> = std::result::Result<T, TrackerError>;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS seen_files (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    sha256 TEXT NOT NULL UNIQUE,
    first_seen_ts TEXT NOT NULL
);
"#;

/// Handle to the seen-file store. Clones share one connection.
#[derive(Debug, Clone)]
pub struct SeenFileTracker {
    conn: DbConnection,
}

impl SeenFileTracker {
    /// Open (or create) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(DbConnection::open_sqlite(path)?)
    }

    /// In-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(DbConnection::open_sqlite_memory()?)
    }

    pub fn from_connection(conn: DbConnection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Content digest of `path`, identical to the one the ledger records.
    pub fn hash(&self, path: &Path) -> Result<String> {
        Ok(trialgate_hash::sha256_file(path)?)
    }

    pub fn is_seen(&self, digest: &str) -> Result<bool> {
        let seen: bool = self.conn.query_scalar(
            "SELECT EXISTS(SELECT 1 FROM seen_files WHERE sha256 = ?)",
            &[DbValue::from(digest)],
        )?;
        Ok(seen)
    }

    /// Record `digest` as accepted. Already-present digests are left untouched.
    ///
    /// Returns `true` if a new record was created.
    pub fn mark_seen(&self, filename: &str, digest: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO seen_files (filename, sha256, first_seen_ts) VALUES (?, ?, ?)",
            &[
                DbValue::from(filename),
                DbValue::from(digest),
                DbValue::from(DbTimestamp::now()),
            ],
        )?;
        debug!(file = %filename, digest = %digest, inserted = inserted > 0, "mark_seen");
        Ok(inserted > 0)
    }

    pub fn record(&self, digest: &str) -> Result<Option<SeenFileRecord>> {
        let row = self.conn.query_optional(
            "SELECT filename, sha256, first_seen_ts FROM seen_files WHERE sha256 = ?",
            &[DbValue::from(digest)],
        )?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(SeenFileRecord {
            filename: row.get_by_name("filename")?,
            sha256: row.get_by_name("sha256")?,
            first_seen: row.get_by_name("first_seen_ts")?,
        }))
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_scalar("SELECT COUNT(*) FROM seen_files", &[])?;
        Ok(count as u64)
    }
}
