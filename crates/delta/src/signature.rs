//! # Overview
//!
//! Block signatures over a baseline file (§3, §4.C): a sequential scan
//! that emits, for each fixed-size block, a 32-bit weak rolling hash and
//! a SHA-256 strong hash, plus the baseline's full-file hash and size.
//!
//! # Examples
//!
//! ```
//! use delta::signature::compute_signature;
//! use std::io::Cursor;
//!
//! let signature = compute_signature(Cursor::new(b"hello world"), 4).unwrap();
//! assert_eq!(signature.block_count(), 3);
//! ```

use std::io::{self, Read};

use hashcodec::hash::{hash_bytes, Sha256Digest};

/// Default delta block size (§4.C): 4 KiB.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// The weak/strong hash pair recorded for one block of a baseline.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockSignature {
    /// Zero-based index of this block within the baseline.
    pub block_index: u64,
    /// 32-bit rolling hash: `sum(bytes) mod 2^32` (§4.C).
    pub weak_hash: u32,
    /// SHA-256 hash of the block's bytes, used to confirm a weak match.
    pub strong_hash: Sha256Digest,
    /// Number of bytes in this block (the trailing block may be short).
    pub size: usize,
}

/// A signature of a baseline file: block size, per-block hashes, and the
/// full-file hash and size (§3, §4.C).
#[derive(Clone, Debug)]
pub struct Signature {
    /// Block size used when this signature was computed.
    pub block_size: usize,
    /// Per-block weak/strong hashes, in baseline order.
    pub blocks: Vec<BlockSignature>,
    /// SHA-256 hash of the entire baseline.
    pub file_hash: Sha256Digest,
    /// Total size in bytes of the baseline.
    pub file_size: u64,
}

impl Signature {
    /// Number of blocks recorded in this signature.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Looks up the block index matching `(weak, strong)`, if any.
    /// Ties are broken by index order, satisfied automatically since
    /// [`compute_signature`] appends blocks in that order and this scans
    /// forward (§4.C "first matching block in index order").
    #[must_use]
    pub fn find_block(&self, weak: u32, strong: Sha256Digest) -> Option<u64> {
        self.blocks
            .iter()
            .find(|block| block.weak_hash == weak && block.strong_hash == strong)
            .map(|block| block.block_index)
    }

    /// Returns the block at `index`, if present.
    #[must_use]
    pub fn block(&self, index: u64) -> Option<&BlockSignature> {
        self.blocks.iter().find(|block| block.block_index == index)
    }
}

/// The compact weak rolling hash of §4.C: `sum(bytes) mod 2^32`.
#[must_use]
pub fn weak_hash(data: &[u8]) -> u32 {
    data.iter().fold(0u32, |acc, &byte| {
        acc.wrapping_add(u32::from(byte))
    })
}

/// Computes the signature of `reader`, split into `block_size`-byte
/// blocks (the trailing block may be shorter).
///
/// # Errors
///
/// Propagates any I/O error raised while reading `reader`.
pub fn compute_signature<R: Read>(mut reader: R, block_size: usize) -> io::Result<Signature> {
    let mut blocks = Vec::new();
    let mut buffer = vec![0u8; block_size];
    let mut block_index = 0u64;
    let mut file_size = 0u64;
    let mut whole_file = Vec::new();

    loop {
        let read = read_fill(&mut reader, &mut buffer)?;
        if read == 0 {
            break;
        }
        let block_bytes = &buffer[..read];
        whole_file.extend_from_slice(block_bytes);
        blocks.push(BlockSignature {
            block_index,
            weak_hash: weak_hash(block_bytes),
            strong_hash: hash_bytes(block_bytes),
            size: read,
        });
        file_size += read as u64;
        block_index += 1;
        if read < block_size {
            break;
        }
    }

    Ok(Signature {
        block_size,
        blocks,
        file_hash: hash_bytes(&whole_file),
        file_size,
    })
}

/// Fills `buffer` from `reader`, stopping short only at EOF. Unlike a
/// single [`Read::read`] call, this keeps reading across short reads so a
/// block is never split by an interrupted syscall.
pub(crate) fn read_fill<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let read = reader.read(&mut buffer[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}
