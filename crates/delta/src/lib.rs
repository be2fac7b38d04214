#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `delta` is component C of the version store: block signatures over a
//! baseline file, rolling-hash delta scripts computed against that
//! signature, and the pure client-side adoption gate that decides
//! whether a delta is worth sending over a full upload (§4.C).
//!
//! # See also
//!
//! - [`signature`] for per-block weak/strong hashing of a baseline.
//! - [`script`] for delta-script construction and application.
//! - [`adopt`] for the transfer-size adoption gate.

pub mod adopt;
pub mod error;
pub mod script;
pub mod signature;

pub use adopt::should_adopt_delta;
pub use error::{DeltaError, Result};
pub use script::{apply_delta, generate_delta, DeltaOp, DeltaOpBody, DeltaScript};
pub use signature::{compute_signature, BlockSignature, Signature, DEFAULT_BLOCK_SIZE};
