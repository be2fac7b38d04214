#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cipher` is component B of the version store: the 256-bit master key,
//! envelope key-file wrap/unwrap with password rotation, and AES-256-GCM
//! encryption of arbitrary byte streams under that key (§4.B).
//!
//! # See also
//!
//! - [`key`] for the in-memory master key handle.
//! - [`kdf`] for password-based key derivation.
//! - [`keyfile`] for the on-disk envelope format and rotation.
//! - [`stream`] for the AEAD stream cipher used on blobs.

pub mod error;
pub mod kdf;
pub mod key;
pub mod keyfile;
pub mod stream;

pub use error::{CipherError, Result};
pub use key::MasterKey;
pub use keyfile::KeyFile;
