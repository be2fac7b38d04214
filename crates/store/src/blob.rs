//! # Overview
//!
//! Durable blob I/O against the backup root (§4.E, §4.F). Every write
//! fsyncs the blob's data and its parent directory entry before
//! returning, so that a write the pipeline has observed as successful
//! survives a crash immediately afterward — the catalog commit that
//! follows is only ever allowed to reference a blob already durable on
//! disk (§4.F "Failure semantics").

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{Result, StoreError};

/// Writes `data` to `root.join(relative)`, creating parent directories
/// as needed, then fsyncs the file and its parent directory before
/// returning.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if any directory creation, write, or
/// fsync fails.
pub fn write_blob(root: &Path, relative: &Path, data: &[u8]) -> Result<u64> {
    let absolute = root.join(relative);
    if let Some(parent) = absolute.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(&absolute)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    if let Some(parent) = absolute.parent() {
        fsync_dir(parent)?;
    }

    tracing::debug!(blob = %relative.display(), bytes = data.len(), "wrote blob");
    Ok(data.len() as u64)
}

/// Reads the full contents of `root.join(relative)`.
///
/// # Errors
///
/// Returns [`StoreError::BlobMissing`] if the path does not exist, and
/// [`StoreError::Io`] for any other read failure.
pub fn read_blob(root: &Path, relative: &Path) -> Result<Vec<u8>> {
    let absolute = root.join(relative);
    fs::read(&absolute).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::BlobMissing {
                path: relative.to_path_buf(),
            }
        } else {
            StoreError::Io(err)
        }
    })
}

/// Returns `true` if `root.join(relative)` exists.
#[must_use]
pub fn blob_exists(root: &Path, relative: &Path) -> bool {
    root.join(relative).is_file()
}

/// Deletes `root.join(relative)` if present. A missing blob is not an
/// error: GC's delete-then-record-remove ordering (§4.I) means this can
/// legitimately race an earlier, interrupted GC run.
///
/// # Errors
///
/// Returns [`StoreError::Io`] for any failure other than the file being
/// already absent.
pub fn delete_blob(root: &Path, relative: &Path) -> Result<()> {
    let absolute = root.join(relative);
    match fs::remove_file(&absolute) {
        Ok(()) => {
            tracing::debug!(blob = %relative.display(), "deleted blob");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(StoreError::Io(err)),
    }
}

/// Returns the size in bytes of `root.join(relative)`.
///
/// # Errors
///
/// Returns [`StoreError::BlobMissing`] if the path does not exist, and
/// [`StoreError::Io`] for any other failure.
pub fn blob_size(root: &Path, relative: &Path) -> Result<u64> {
    let absolute = root.join(relative);
    fs::metadata(&absolute)
        .map(|meta| meta.len())
        .map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StoreError::BlobMissing {
                    path: relative.to_path_buf(),
                }
            } else {
                StoreError::Io(err)
            }
        })
}

/// Fsyncs a directory so that a prior file creation or rename inside it
/// is durable, not just the file's own contents (§4.F).
#[cfg(unix)]
fn fsync_dir(dir: &Path) -> Result<()> {
    let handle = OpenOptions::new().read(true).open(dir)?;
    rustix::fs::fsync(&handle).map_err(|err| StoreError::Io(err.into()))?;
    Ok(())
}

#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
