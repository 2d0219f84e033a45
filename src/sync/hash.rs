//! Content hashing for sync operations.
//!
//! This module provides SHA256-based content hashing for change detection.
//! Body text and attachment bytes are hashed the same way: over the raw
//! bytes, so a string and a buffer with identical content produce identical
//! digests. Text callers pass UTF-8 bytes.

use sha2::{Digest, Sha256};

/// Compute a SHA256 hex digest of a byte sequence.
///
/// Used for:
/// - Detecting whether the locally stored body text changed since last sync
/// - Deduplicating attachment transfers when neither side changed
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Check if content has changed relative to a stored hash.
///
/// Returns `true` if:
/// - There is no stored hash (never synced)
/// - The current hash differs from the stored hash
///
/// Returns `false` if the hashes match (no change).
#[must_use]
pub fn has_changed(current_hash: &str, stored_hash: Option<&str>) -> bool {
    stored_hash.is_none_or(|h| h != current_hash)
}
