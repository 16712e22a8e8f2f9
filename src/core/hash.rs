//! Snapshot Fingerprinting
//!
//! SHA-256 over a canonical encoding of the world view. Two snapshots with
//! the same positions, scores and coins hash identically, so clients can
//! skip redraws and tests can compare reads cheaply.

use sha2::{Digest, Sha256};

/// Hash output type (256 bits / 32 bytes)
pub type SnapshotHash = [u8; 32];

/// Incremental hasher with length-prefixed field encoding.
///
/// Order of updates matters; callers feed fields in a fixed order.
pub struct SnapshotHasher {
    hasher: Sha256,
}

impl SnapshotHasher {
    /// Create a new hasher with a domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Hasher for world snapshots.
    pub fn for_snapshot() -> Self {
        Self::new(b"COIN_GRID_SNAPSHOT_V1")
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i64 value (little-endian).
    #[inline]
    pub fn update_i64(&mut self, value: i64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a string, prefixed by its byte length.
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> SnapshotHash {
        self.hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_input_same_hash() {
        let mut a = SnapshotHasher::for_snapshot();
        let mut b = SnapshotHasher::for_snapshot();
        a.update_str("alice");
        a.update_i64(3);
        b.update_str("alice");
        b.update_i64(3);
        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_length_prefix_separates_fields() {
        let mut a = SnapshotHasher::for_snapshot();
        a.update_str("ab");
        a.update_str("c");
        let mut b = SnapshotHasher::for_snapshot();
        b.update_str("a");
        b.update_str("bc");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_domain_separation() {
        let a = SnapshotHasher::new(b"A").finalize();
        let b = SnapshotHasher::new(b"B").finalize();
        assert_ne!(a, b);
    }
}
