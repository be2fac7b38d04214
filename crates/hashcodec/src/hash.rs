//! # Overview
//!
//! Streaming SHA-256 content hashing (§4.A). Every plaintext that enters
//! or leaves the version store is hashed the same way: read in fixed
//! chunks, never buffered whole into memory.
//!
//! # Examples
//!
//! ```
//! use hashcodec::hash::hash_bytes;
//!
//! let digest = hash_bytes(b"hello\n");
//! assert_eq!(digest.to_hex().len(), 64);
//! ```

use std::io::{self, Read};

use sha2::{Digest, Sha256};

/// Size of the chunks read while streaming a hash (§4.A).
const CHUNK_SIZE: usize = 4096;

/// A SHA-256 digest, stored as raw bytes with hex-encoding helpers.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Sha256Digest([u8; 32]);

impl Sha256Digest {
    /// Wraps a raw 32-byte digest.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Renders the digest as a lowercase hex string, the form used for
    /// `plaintext_hash` and dedup keys throughout the catalog (§3).
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in &self.0 {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }

    /// Parses a digest back out of a lowercase (or mixed-case) hex
    /// string, as stored in the catalog.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (index, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).ok()?;
            bytes[index] = u8::from_str_radix(pair, 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl std::fmt::Debug for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Streams `reader` to completion, returning its SHA-256 digest and total
/// byte count. Reads in [`CHUNK_SIZE`] chunks so the caller never buffers
/// the whole stream in memory.
///
/// # Errors
///
/// Propagates any I/O error raised while reading `reader`.
pub fn hash_stream<R: Read>(mut reader: R) -> io::Result<(Sha256Digest, u64)> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        total += read as u64;
    }

    let digest: [u8; 32] = hasher.finalize().into();
    Ok((Sha256Digest::from_bytes(digest), total))
}

/// Hashes an in-memory byte slice. Convenience wrapper over
/// [`hash_stream`] for callers that already hold the bytes.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> Sha256Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Sha256Digest::from_bytes(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn hash_bytes_is_stable() {
        let a = hash_bytes(b"hello\n");
        let b = hash_bytes(b"hello\n");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_stream_matches_hash_bytes() {
        let data = b"The quick brown fox jumps over the lazy dog".repeat(10);
        let (streamed, len) = hash_stream(Cursor::new(&data)).unwrap();
        assert_eq!(len, data.len() as u64);
        assert_eq!(streamed, hash_bytes(&data));
    }

    #[test]
    fn hex_round_trips() {
        let digest = hash_bytes(b"round trip");
        let hex = digest.to_hex();
        assert_eq!(Sha256Digest::from_hex(&hex), Some(digest));
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(Sha256Digest::from_hex("deadbeef").is_none());
    }

    #[test]
    fn empty_stream_hashes_to_known_sha256() {
        let (digest, len) = hash_stream(Cursor::new(b"")).unwrap();
        assert_eq!(len, 0);
        assert_eq!(
            digest.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
