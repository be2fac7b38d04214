//! # Overview
//!
//! JSON wire encodings for the types §4.C and §4.D pass across the
//! connection: block signatures, delta operations, and catalog
//! statistics (§6). These are plain data — this crate has no dependency
//! on `delta` or `catalog`, so the agent binary that does depend on both
//! converts between them and the domain types at the boundary.

use serde::{Deserialize, Serialize};

/// Wire form of one baseline block's fingerprint (§6).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireBlockSignature {
    /// Zero-based block index.
    pub num: u64,
    /// 32-bit weak rolling hash.
    pub weak_hash: u32,
    /// Hex-encoded SHA-256 strong hash.
    pub strong_hash: String,
    /// Block size in bytes (the trailing block may be short).
    pub size: usize,
}

/// Wire form of a baseline [`Signature`](../../delta/struct.Signature.html)
/// (§6).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireSignature {
    /// Total size of the baseline in bytes.
    pub file_size: u64,
    /// Block size used to compute the signature.
    pub block_size: usize,
    /// Number of blocks.
    pub block_count: usize,
    /// Hex-encoded SHA-256 hash of the whole baseline.
    pub file_hash: String,
    /// Per-block fingerprints, in baseline order.
    pub blocks: Vec<WireBlockSignature>,
}

/// Wire form of one delta operation (§6): either a reference to a
/// baseline block or literal bytes, tagged by `type`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireDeltaOp {
    /// Copy a block from the baseline, identified by index.
    Block {
        /// Index of the baseline block to copy.
        block_num: u64,
        /// Absolute output offset of this operation.
        position: u64,
    },
    /// Write literal bytes not present in the baseline.
    Data {
        /// Base64-encoded literal bytes.
        data: String,
        /// Absolute output offset of this operation.
        position: u64,
    },
}

/// Wire form of a full [`DeltaScript`](../../delta/struct.DeltaScript.html)
/// (§6).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireDeltaScript {
    /// Block size the originating signature was computed with.
    pub block_size: usize,
    /// The operations, in output order.
    pub ops: Vec<WireDeltaOp>,
}

/// Wire form of [`catalog::Stats`] (§4.J `get_stats`).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireStats {
    /// Total number of file-version records across all paths.
    pub total_versions: u64,
    /// Number of distinct logical paths with at least one version.
    pub total_paths: u64,
    /// Number of unique dedup objects.
    pub total_dedup_objects: u64,
    /// Bytes actually on disk in the dedup store.
    pub dedup_store_bytes: u64,
    /// Sum of every version's logical (undeduped) size.
    pub logical_bytes: u64,
}
