//! SHA-256 digests for downloaded assets.
//!
//! Digests are rendered as lowercase hex; comparison against a declared value
//! ignores case and surrounding whitespace.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Incremental hasher fed while bytes stream to disk
#[derive(Default)]
pub struct StreamHasher {
    inner: Sha256,
}

impl StreamHasher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    #[must_use]
    pub fn finish(self) -> String {
        format!("{:x}", self.inner.finalize())
    }
}

/// Digest of an in-memory buffer
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Digest of a file, read in chunks
pub async fn sha256_file(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = StreamHasher::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finish())
}

/// Case-insensitive digest comparison
#[must_use]
pub fn checksum_matches(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}
