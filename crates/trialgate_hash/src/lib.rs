//! SHA-256 hashing for content identity
//!
//! The hex digest of a file's bytes is the identity used by the seen-file
//! tracker and by the error ledger's `sha256` field. Both must agree, so both
//! go through [`sha256_file`].

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Block size used when streaming a file through the digest.
pub const HASH_BLOCK_SIZE: usize = 1 << 20;

/// Errors from hashing a file.
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, HashError>;

/// Compute SHA256 hash of data
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Stream a file through SHA-256 in [`HASH_BLOCK_SIZE`] blocks.
///
/// Memory use is bounded by one block regardless of file size.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|source| HashError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    sha256_reader(file).map_err(|source| HashError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Stream any reader through SHA-256.
pub fn sha256_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BLOCK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
