#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `hashcodec` is component A of the version store: streaming SHA-256
//! content hashing and gzip stream compression, both operating directly
//! on `Read`/`Write` so the pipeline can chain them without buffering a
//! whole file into memory (§4.A).
//!
//! # See also
//!
//! - [`hash`] for content hashing and hex digest helpers.
//! - [`gzip`] for best-effort stream compression with identity fallback.

pub mod gzip;
pub mod hash;

pub use gzip::{compress, decompress, CompressOutcome, CompressionLevel};
pub use hash::{hash_bytes, hash_stream, Sha256Digest};
