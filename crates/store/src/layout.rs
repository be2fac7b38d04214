//! # Overview
//!
//! On-disk path computation for the backup root's three subtrees (§4.E):
//! `dedup_store/`, `versions/`, and `current/`. Every function here is
//! pure path arithmetic; no I/O happens until [`crate::blob`] or
//! [`crate::shadow`] touches the filesystem.

use std::path::PathBuf;

/// Appends the `.gz` and/or `.enc` suffixes a blob's pipeline flags
/// imply, in that fixed order (§4.E): compression always wraps the
/// plaintext before encryption wraps the compressed bytes, so the
/// suffix order mirrors the on-disk wrapping order.
fn append_suffixes(mut name: String, compressed: bool, encrypted: bool) -> String {
    if compressed {
        name.push_str(".gz");
    }
    if encrypted {
        name.push_str(".enc");
    }
    name
}

/// The content-addressed dedup blob path for `hash`, relative to the
/// backup root: `dedup_store/<hash[0:2]>/<hash[2:4]>/<hash>[.gz][.enc]`
/// (§4.E). The two-level, two-character sharding caps per-directory
/// fan-out regardless of corpus size.
///
/// # Panics
///
/// Panics if `hash` is shorter than 4 characters; every caller passes a
/// 64-character SHA-256 hex digest.
#[must_use]
pub fn dedup_blob_path(hash: &str, compressed: bool, encrypted: bool) -> PathBuf {
    assert!(hash.len() >= 4, "hash too short to shard: {hash}");
    let (shard_a, rest) = hash.split_at(2);
    let (shard_b, _) = rest.split_at(2);
    PathBuf::from("dedup_store")
        .join(shard_a)
        .join(shard_b)
        .join(append_suffixes(hash.to_string(), compressed, encrypted))
}

/// The non-dedup version blob path, relative to the backup root:
/// `versions/<timestamp>/<relative_path>[.gz][.enc]` (§4.E), used only
/// when deduplication is disabled.
#[must_use]
pub fn version_blob_path(
    timestamp: &str,
    relative_path: &str,
    compressed: bool,
    encrypted: bool,
) -> PathBuf {
    let file_name = append_suffixes(relative_path.to_string(), compressed, encrypted);
    PathBuf::from("versions").join(timestamp).join(file_name)
}

/// The `current/` shadow path for a logical file, mirroring the latest
/// plaintext byte-for-byte (§4.E). Never carries `.gz`/`.enc` suffixes:
/// the shadow tree is always plaintext, used only as a change-detection
/// cache (§9).
#[must_use]
pub fn current_path(relative_path: &str) -> PathBuf {
    PathBuf::from("current").join(relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_path_shards_by_first_four_hex_chars() {
        let path = dedup_blob_path("abcd1234ef", false, false);
        assert_eq!(path, PathBuf::from("dedup_store/ab/cd/abcd1234ef"));
    }

    #[test]
    fn dedup_path_appends_suffixes_in_fixed_order() {
        let path = dedup_blob_path("abcd1234ef", true, true);
        assert_eq!(path, PathBuf::from("dedup_store/ab/cd/abcd1234ef.gz.enc"));
    }

    #[test]
    fn version_path_nests_under_timestamp() {
        let path = version_blob_path("2026-01-01_00-00-00-000000", "docs/a.txt", true, false);
        assert_eq!(
            path,
            PathBuf::from("versions/2026-01-01_00-00-00-000000/docs/a.txt.gz")
        );
    }

    #[test]
    fn current_path_never_carries_suffixes() {
        let path = current_path("docs/a.txt");
        assert_eq!(path, PathBuf::from("current/docs/a.txt"));
    }
}
