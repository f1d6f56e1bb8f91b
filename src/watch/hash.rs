// src/watch/hash.rs

use blake3::Hasher;

/// Fingerprint of a file's raw bytes.
///
/// Parsing is deterministic, so equal fingerprints mean equal records and a
/// re-fired save can be dropped without parsing at all. Unequal fingerprints
/// prove nothing (whitespace, key order) and fall back to record equality.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}
