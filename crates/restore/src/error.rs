//! Error type for the restore crate (§4.K).

use core::Error as CoreError;

/// Errors raised while restoring a version to disk.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    /// The catalog returned an error.
    #[error("catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    /// The store returned an error while reading a blob.
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),

    /// Decryption failed: wrong password/key, or tampered ciphertext.
    #[error("cipher error: {0}")]
    Cipher(#[from] cipher::CipherError),

    /// Decompression failed on a blob recorded as compressed.
    #[error("decompression failed: {0}")]
    Decompress(#[from] std::io::Error),

    /// The requested `(path, timestamp)` has no version record.
    #[error("no such version: {path} @ {timestamp}")]
    VersionNotFound {
        /// The logical path that was requested.
        path: String,
        /// The timestamp that was requested.
        timestamp: String,
    },

    /// The restored byte-hash does not match the recorded
    /// `plaintext_hash` (§4.G step 3).
    #[error("corruption detected: expected hash {expected}, got {actual}")]
    CorruptionDetected {
        /// Hash recorded in the catalog.
        expected: String,
        /// Hash actually computed from the restored bytes.
        actual: String,
    },
}

impl From<RestoreError> for CoreError {
    fn from(err: RestoreError) -> Self {
        match err {
            RestoreError::Catalog(catalog_err) => catalog_err.into(),
            RestoreError::Store(store_err) => store_err.into(),
            RestoreError::Cipher(_) => Self::BadPassword,
            RestoreError::Decompress(io_err) => Self::Io(io_err),
            RestoreError::VersionNotFound { path, timestamp } => Self::NotFound {
                what: format!("{path} @ {timestamp}"),
            },
            RestoreError::CorruptionDetected { expected, actual } => {
                Self::CorruptionDetected { expected, actual }
            }
        }
    }
}

/// Convenience alias for fallible restore operations.
pub type Result<T> = std::result::Result<T, RestoreError>;
