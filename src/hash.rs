// src/hash.rs

//! SHA-256 hashing for source integrity and cache keys
//!
//! Source archives are verified against the recipe's `checksum=` value, which
//! may be written bare (`<hex>`) or prefixed (`sha256:<hex>`). Patch cache
//! entries are keyed by a short hash of the patch specification string so the
//! same specification maps to the same cache path on every run.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Length of the hex prefix used for cache keys
const CACHE_KEY_LEN: usize = 16;

/// Compute the SHA-256 of a byte slice as lowercase hex
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute the SHA-256 of data from a reader
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 of a file, streaming its content
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    sha256_reader(&mut file)
}

/// Normalize a configured checksum: strip an optional `sha256:` prefix,
/// trim and lowercase
pub fn normalize_checksum(expected: &str) -> String {
    let trimmed = expected.trim();
    let value = trimmed
        .strip_prefix("sha256:")
        .or_else(|| trimmed.strip_prefix("SHA256:"))
        .unwrap_or(trimmed);
    value.to_ascii_lowercase()
}

/// Check whether an actual hex digest matches a configured checksum
pub fn checksum_matches(expected: &str, actual: &str) -> bool {
    normalize_checksum(expected) == actual.to_ascii_lowercase()
}

/// Stable cache key for an arbitrary specification string
pub fn cache_key(spec: &str) -> String {
    let mut digest = sha256(spec.as_bytes());
    digest.truncate(CACHE_KEY_LEN);
    digest
}
