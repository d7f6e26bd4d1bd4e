use serde::Serialize;
use sha2::{Digest, Sha256};

use super::Block;

/// SHA-256 of `bytes`, hex-encoded (64 lowercase chars).
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Canonical digest of any serializable value.
///
/// The value goes through `serde_json::Value` first; its object maps keep
/// keys sorted, so the digest does not depend on field or insertion order.
pub fn hash_json<T: Serialize + ?Sized>(value: &T) -> String {
    let canonical = serde_json::to_value(value)
        .map(|v| v.to_string())
        .unwrap_or_default();
    sha256_hex(canonical.as_bytes())
}

/// Digest of a whole block, as referenced by the next block's `previous_hash`.
pub fn hash_block(block: &Block) -> String {
    hash_json(block)
}
