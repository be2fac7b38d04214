#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `store` is component E of the version store: the on-disk layout of
//! the backup root's three subtrees (§4.E) and the durable I/O
//! primitives over them. It knows nothing about hashing, compression,
//! encryption, or the catalog — those live in [`hashcodec`], `cipher`,
//! and `catalog` respectively, and the `pipeline`/`restore` crates
//! compose all of them.
//!
//! # See also
//!
//! - [`layout`] for path computation.
//! - [`blob`] for durable dedup/version blob I/O.
//! - [`shadow`] for the `current/` change-detection cache.

pub mod blob;
pub mod error;
pub mod layout;
pub mod shadow;

pub use error::{Result, StoreError};
