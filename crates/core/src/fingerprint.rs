//! Collection fingerprinting for the polling fallback.
//!
//! A fingerprint is a cheap, order-sensitive summary of a collection: a
//! SHA-256 digest over every row's identifier and last-modified timestamp.
//! Two fetches with the same fingerprint are treated as unchanged without
//! comparing full content. Every row participates, so a change anywhere in
//! the collection is always detected.

use sha2::{Digest, Sha256};

use crate::types::{DbId, Timestamp};

/// An opaque collection fingerprint. Compare with `==`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hex digest, mostly useful for logging.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

/// Summarize a collection from its (id, updated_at) pairs.
///
/// Order-sensitive: callers are expected to fetch with a stable ORDER BY.
/// The empty collection has a stable fingerprint distinct from any
/// non-empty one.
pub fn fingerprint_rows<I>(rows: I) -> Fingerprint
where
    I: IntoIterator<Item = (DbId, Timestamp)>,
{
    let mut hasher = Sha256::new();
    let mut count: u64 = 0;
    for (id, updated_at) in rows {
        hasher.update(id.to_be_bytes());
        hasher.update(updated_at.timestamp_micros().to_be_bytes());
        count += 1;
    }
    hasher.update(count.to_be_bytes());

    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(hex, "{byte:02x}");
    }
    Fingerprint(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn identical_collections_match() {
        let a = fingerprint_rows([(1, ts(100)), (2, ts(200))]);
        let b = fingerprint_rows([(1, ts(100)), (2, ts(200))]);
        assert_eq!(a, b);
    }

    #[test]
    fn any_row_change_is_detected() {
        let base = fingerprint_rows([(1, ts(100)), (2, ts(200)), (3, ts(300))]);
        // Touching the middle row must change the digest — no sampling window.
        let touched = fingerprint_rows([(1, ts(100)), (2, ts(201)), (3, ts(300))]);
        assert_ne!(base, touched);
    }

    #[test]
    fn row_count_is_part_of_the_digest() {
        let two = fingerprint_rows([(1, ts(100)), (2, ts(200))]);
        let three = fingerprint_rows([(1, ts(100)), (2, ts(200)), (3, ts(300))]);
        assert_ne!(two, three);
    }

    #[test]
    fn empty_collection_is_stable_and_distinct() {
        let empty = fingerprint_rows([]);
        assert_eq!(empty, fingerprint_rows([]));
        assert_ne!(empty, fingerprint_rows([(1, ts(1))]));
    }

    #[test]
    fn order_matters() {
        let forward = fingerprint_rows([(1, ts(100)), (2, ts(200))]);
        let reversed = fingerprint_rows([(2, ts(200)), (1, ts(100))]);
        assert_ne!(forward, reversed);
    }
}
