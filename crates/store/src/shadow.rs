//! # Overview
//!
//! The `current/` shadow tree (§3, §4.E): a plaintext mirror of the
//! latest bytes saved for each logical path, used only to short-circuit
//! no-op saves (§4.F step 2). It is derivable cache, never the system of
//! record — losing it entirely only costs a round of redundant full
//! uploads, never data.

use std::fs;
use std::path::Path;

use hashcodec::hash::{hash_bytes, Sha256Digest};

use crate::error::Result;
use crate::layout::current_path;

/// Reads the shadow's current hash for `relative_path`, if it exists.
///
/// # Errors
///
/// Returns [`crate::error::StoreError::Io`] for any read failure other
/// than the shadow being absent.
pub fn read_current_hash(root: &Path, relative_path: &str) -> Result<Option<Sha256Digest>> {
    let absolute = root.join(current_path(relative_path));
    match fs::read(&absolute) {
        Ok(bytes) => Ok(Some(hash_bytes(&bytes))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Overwrites the shadow for `relative_path` with `plaintext`, creating
/// parent directories as needed (§4.F step 7).
///
/// # Errors
///
/// Returns [`crate::error::StoreError::Io`] on any write failure.
pub fn write_current(root: &Path, relative_path: &str, plaintext: &[u8]) -> Result<()> {
    let absolute = root.join(current_path(relative_path));
    if let Some(parent) = absolute.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&absolute, plaintext)?;
    Ok(())
}

/// Removes the shadow for `relative_path`, if present (§4.F "Delete").
///
/// # Errors
///
/// Returns [`crate::error::StoreError::Io`] for any failure other than
/// the shadow being already absent.
pub fn delete_current(root: &Path, relative_path: &str) -> Result<()> {
    let absolute = root.join(current_path(relative_path));
    match fs::remove_file(&absolute) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Returns `true` if a shadow exists for `relative_path`.
#[must_use]
pub fn current_exists(root: &Path, relative_path: &str) -> bool {
    root.join(current_path(relative_path)).is_file()
}
