//! Store-crate-local error type, mapped into [`core::error::Error`] at the
//! boundary the rest of the version store calls through.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing the on-disk layout.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A catalog entry pointed at a blob that is no longer on disk.
    #[error("blob missing: {path}")]
    BlobMissing {
        /// Path the blob was expected at, relative to the backup root.
        path: PathBuf,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for core::error::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BlobMissing { path } => Self::BlobMissing {
                hash: path.display().to_string(),
                path,
            },
            StoreError::Io(io_err) => Self::Io(io_err),
        }
    }
}

/// Convenience alias for store-crate fallible operations.
pub type Result<T> = std::result::Result<T, StoreError>;
