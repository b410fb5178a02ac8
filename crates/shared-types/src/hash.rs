//! Document fingerprint helpers.
//!
//! The registry keys documents by the sha256 hex digest of their canonical
//! JSON metadata. Hashes arriving from callers may carry a `0x` prefix and
//! mixed case; `normalize_hash` is applied before any lookup or comparison.

use sha2::{Digest, Sha256};

/// Compute the hex fingerprint of a document's metadata.
///
/// The digest is taken over the serde_json serialization of `metadata`,
/// which is stable for a given value.
#[must_use]
pub fn fingerprint_metadata(metadata: &serde_json::Value) -> String {
    let canonical = metadata.to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}

/// Normalize a caller-supplied hash for lookup: strip any `0x` prefix and
/// lowercase the hex.
#[must_use]
pub fn normalize_hash(hash: &str) -> String {
    hash.strip_prefix("0x").unwrap_or(hash).to_ascii_lowercase()
}
