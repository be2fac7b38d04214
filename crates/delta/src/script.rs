//! # Overview
//!
//! Delta-script construction and application (§3, §4.C): a block-aligned
//! scan of a new file against a baseline [`Signature`], coalescing
//! unmatched bytes into `literal` operations, and the inverse
//! reconstruction step.
//!
//! # Examples
//!
//! ```
//! use delta::signature::compute_signature;
//! use delta::script::{generate_delta, apply_delta};
//! use std::io::Cursor;
//!
//! let baseline = b"the quick brown fox".repeat(10);
//! let target = b"the quick brown fox".repeat(9).into_iter().chain(*b"!!!!!!!!!!!!!!!!!!!").collect::<Vec<u8>>();
//!
//! let signature = compute_signature(Cursor::new(&baseline), 8).unwrap();
//! let script = generate_delta(Cursor::new(&target), &signature).unwrap();
//!
//! let mut reconstructed = Vec::new();
//! apply_delta(Cursor::new(&baseline), &script, &mut reconstructed).unwrap();
//! assert_eq!(reconstructed, target);
//! ```

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom, Write};

use hashcodec::hash::{hash_bytes, Sha256Digest};

use crate::error::{DeltaError, Result};
use crate::signature::{read_fill, weak_hash, Signature};

/// A single delta operation, annotated with its absolute output offset
/// (§3).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeltaOp {
    /// Absolute byte offset of this operation's output within the
    /// reconstructed file.
    pub offset: u64,
    /// The operation itself.
    pub body: DeltaOpBody,
}

/// The two kinds of delta operation (§3).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeltaOpBody {
    /// Copy block `block_index` from the baseline.
    Copy {
        /// Index of the baseline block to copy, as recorded in its
        /// [`crate::signature::BlockSignature`].
        block_index: u64,
    },
    /// Write `bytes` verbatim; carries data the baseline did not have.
    Literal {
        /// The new bytes to write.
        bytes: Vec<u8>,
    },
}

/// An ordered list of [`DeltaOp`]s reconstructing one target file against
/// one baseline signature (§3, §4.C).
#[derive(Clone, Debug)]
pub struct DeltaScript {
    /// Block size the baseline signature was computed with; `copy`
    /// operations index blocks of this size.
    pub block_size: usize,
    /// The operations, in output order.
    pub ops: Vec<DeltaOp>,
}

impl DeltaScript {
    /// Number of `copy` operations in this script.
    #[must_use]
    pub fn copy_ops(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op.body, DeltaOpBody::Copy { .. }))
            .count()
    }

    /// Total bytes carried by `literal` operations.
    #[must_use]
    pub fn literal_bytes(&self) -> u64 {
        self.ops
            .iter()
            .filter_map(|op| match &op.body {
                DeltaOpBody::Literal { bytes } => Some(bytes.len() as u64),
                DeltaOpBody::Copy { .. } => None,
            })
            .sum()
    }

    /// The theoretical wire transfer size of §4.C's adoption gate:
    /// `8 × copy_ops + Σ literal_bytes` (each `copy` costs an 8-byte
    /// block reference; each `literal` costs its raw bytes).
    #[must_use]
    pub fn transfer_size(&self) -> u64 {
        8 * self.copy_ops() as u64 + self.literal_bytes()
    }
}

/// Scans `new_reader` block-aligned against `baseline`, emitting a
/// [`DeltaScript`] that reconstructs it: matched blocks become `copy`
/// operations, unmatched bytes coalesce into trailing `literal`
/// operations, and the final short block (if any) is always a literal
/// (§4.C).
///
/// # Errors
///
/// Propagates any I/O error raised while reading `new_reader`.
pub fn generate_delta<R: Read>(mut new_reader: R, baseline: &Signature) -> io::Result<DeltaScript> {
    let block_size = baseline.block_size;

    // First occurrence wins, matching "first matching block in index
    // order" (§4.C): iterating forward and using `entry().or_insert`
    // never overwrites an earlier index with a later duplicate.
    let mut index: HashMap<(u32, Sha256Digest), u64> = HashMap::new();
    for block in &baseline.blocks {
        index
            .entry((block.weak_hash, block.strong_hash))
            .or_insert(block.block_index);
    }

    let mut ops: Vec<DeltaOp> = Vec::new();
    let mut buffer = vec![0u8; block_size.max(1)];
    let mut offset = 0u64;

    loop {
        let read = read_fill(&mut new_reader, &mut buffer)?;
        if read == 0 {
            break;
        }
        let chunk = &buffer[..read];
        let is_full_block = read == block_size;
        let matched = is_full_block
            .then(|| index.get(&(weak_hash(chunk), hash_bytes(chunk))).copied())
            .flatten();

        match matched {
            Some(block_index) => {
                ops.push(DeltaOp {
                    offset,
                    body: DeltaOpBody::Copy { block_index },
                });
            }
            None => {
                if let Some(DeltaOp {
                    body: DeltaOpBody::Literal { bytes },
                    ..
                }) = ops.last_mut()
                {
                    bytes.extend_from_slice(chunk);
                } else {
                    ops.push(DeltaOp {
                        offset,
                        body: DeltaOpBody::Literal {
                            bytes: chunk.to_vec(),
                        },
                    });
                }
            }
        }
        offset += read as u64;
    }

    Ok(DeltaScript { block_size, ops })
}

/// Reconstructs a file by replaying `script` against `baseline`,
/// `copy` operations re-reading the referenced block by seeking, and
/// `literal` operations writing their bytes verbatim (§4.C).
///
/// # Errors
///
/// Returns [`DeltaError::UnknownBlock`] if a `copy` operation references
/// a block past the end of `baseline`, and [`DeltaError::Io`] for
/// underlying I/O failures.
pub fn apply_delta<B: Read + Seek, W: Write>(
    mut baseline: B,
    script: &DeltaScript,
    out: &mut W,
) -> Result<()> {
    let mut buffer = vec![0u8; script.block_size.max(1)];
    for op in &script.ops {
        match &op.body {
            DeltaOpBody::Copy { block_index } => {
                let byte_offset = block_index
                    .checked_mul(script.block_size as u64)
                    .ok_or(DeltaError::UnknownBlock(*block_index))?;
                baseline.seek(SeekFrom::Start(byte_offset))?;
                let read = read_fill(&mut baseline, &mut buffer)?;
                if read == 0 {
                    return Err(DeltaError::UnknownBlock(*block_index));
                }
                out.write_all(&buffer[..read])?;
            }
            DeltaOpBody::Literal { bytes } => {
                out.write_all(bytes)?;
            }
        }
    }
    Ok(())
}
