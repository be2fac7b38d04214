//! # Overview
//!
//! Gzip stream compression for blobs written through the version
//! pipeline (§4.A). Compression is best-effort: if the encoder fails for
//! any reason, the caller falls back to an identity copy and records
//! `compressed = false` in the catalog rather than failing the save.
//! Decompression has no such fallback — it fails loudly, since a blob
//! tagged `compressed = true` that does not decode is corruption.
//!
//! # Examples
//!
//! ```
//! use hashcodec::gzip::{compress, decompress, CompressionLevel};
//! use std::io::Cursor;
//!
//! let data = b"highly compressible payload".repeat(20);
//! let mut compressed = Vec::new();
//! let outcome = compress(Cursor::new(&data), &mut compressed, CompressionLevel::Default).unwrap();
//! assert!(outcome.compressed);
//!
//! let mut restored = Vec::new();
//! decompress(Cursor::new(&compressed), &mut restored).unwrap();
//! assert_eq!(restored, data);
//! ```

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Compression levels accepted by [`compress`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompressionLevel {
    /// gzip level 6, the pipeline default (§4.A).
    Default,
    /// Favour speed over ratio.
    Fast,
    /// Favour ratio over speed.
    Best,
}

impl From<CompressionLevel> for Compression {
    fn from(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Default => Compression::new(6),
            CompressionLevel::Fast => Compression::fast(),
            CompressionLevel::Best => Compression::best(),
        }
    }
}

/// Reports whether [`compress`] actually produced a gzip stream or fell
/// back to an identity copy, plus the byte count written to `out`.
#[derive(Clone, Copy, Debug)]
pub struct CompressOutcome {
    /// `false` when the encoder failed and `out` received an identity
    /// copy of `input` instead. The pipeline records this as
    /// `compressed = false` on the version/dedup record (§4.A, §4.F).
    pub compressed: bool,
    /// Number of bytes written to `out`.
    pub bytes_written: u64,
}

/// Compresses `input` into `out` at the requested level.
///
/// On encoder failure, falls back to copying `input` into `out`
/// unmodified and reports `compressed = false` rather than failing the
/// save outright (§4.A).
///
/// # Errors
///
/// Returns an error only if both the compression attempt and the
/// identity-copy fallback fail (e.g. `input` itself cannot be read, or
/// `out` cannot be written to at all).
pub fn compress<R: Read, W: Write>(
    mut input: R,
    out: &mut W,
    level: CompressionLevel,
) -> io::Result<CompressOutcome> {
    let mut buffered = Vec::new();
    input.read_to_end(&mut buffered)?;

    let mut encoder = GzEncoder::new(Vec::new(), level.into());
    let encode_result = encoder
        .write_all(&buffered)
        .and_then(|()| encoder.finish());

    match encode_result {
        Ok(compressed_bytes) => {
            out.write_all(&compressed_bytes)?;
            Ok(CompressOutcome {
                compressed: true,
                bytes_written: compressed_bytes.len() as u64,
            })
        }
        Err(_) => {
            out.write_all(&buffered)?;
            Ok(CompressOutcome {
                compressed: false,
                bytes_written: buffered.len() as u64,
            })
        }
    }
}

/// Decompresses a gzip stream written by [`compress`]. Fails loudly: a
/// blob recorded as `compressed = true` that does not decode cleanly is
/// corruption, not something to silently paper over (§4.A, §4.G).
///
/// # Errors
///
/// Propagates any I/O or gzip-framing error encountered while decoding.
pub fn decompress<R: Read, W: Write>(input: R, out: &mut W) -> io::Result<u64> {
    let mut decoder = GzDecoder::new(input);
    io::copy(&mut decoder, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip_preserves_payload() {
        let data = b"The quick brown fox jumps over the lazy dog".repeat(50);
        let mut compressed = Vec::new();
        let outcome = compress(Cursor::new(&data), &mut compressed, CompressionLevel::Default)
            .expect("compress");
        assert!(outcome.compressed);
        assert!((compressed.len() as u64) < data.len() as u64);

        let mut restored = Vec::new();
        decompress(Cursor::new(&compressed), &mut restored).expect("decompress");
        assert_eq!(restored, data);
    }

    #[test]
    fn empty_input_round_trips() {
        let mut compressed = Vec::new();
        compress(Cursor::new(b""), &mut compressed, CompressionLevel::Default).unwrap();
        let mut restored = Vec::new();
        decompress(Cursor::new(&compressed), &mut restored).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn decompress_rejects_garbage_input() {
        let mut restored = Vec::new();
        let result = decompress(Cursor::new(b"not gzip data"), &mut restored);
        assert!(result.is_err());
    }

    #[test]
    fn best_and_fast_levels_both_round_trip() {
        let data = b"abcdefghij".repeat(200);
        for level in [CompressionLevel::Fast, CompressionLevel::Best] {
            let mut compressed = Vec::new();
            compress(Cursor::new(&data), &mut compressed, level).unwrap();
            let mut restored = Vec::new();
            decompress(Cursor::new(&compressed), &mut restored).unwrap();
            assert_eq!(restored, data);
        }
    }
}
