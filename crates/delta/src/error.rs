//! Delta-crate-local error type.

use thiserror::Error;

/// Errors raised while computing, generating, or applying delta scripts.
#[derive(Debug, Error)]
pub enum DeltaError {
    /// A `copy` operation referenced a block index absent from the
    /// baseline, e.g. because the script was computed against a
    /// different baseline than the one supplied to [`crate::apply_delta`].
    #[error("delta references unknown baseline block {0}")]
    UnknownBlock(u64),

    /// Underlying I/O failure reading the baseline, the new file, or the
    /// output stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for delta-crate fallible operations.
pub type Result<T> = std::result::Result<T, DeltaError>;
