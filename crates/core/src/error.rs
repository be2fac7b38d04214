//! # Overview
//!
//! The error taxonomy shared by every component of the version store
//! (§4.A-J). Call sites return this enum, or a narrower per-crate error
//! that maps into it at the boundary, rather than ad-hoc strings.
//!
//! # Design
//!
//! The eight kinds mirror the error handling design: each is a distinct,
//! matchable condition rather than a free-form message, so that command
//! dispatch (`agent-protocol`) can turn any of them into a structured
//! response without string sniffing.
//!
//! # See also
//!
//! - [`crate::config`] for the agent start-up inputs whose validation
//!   failures surface through this enum.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The error taxonomy of §7: every fallible operation in the version
/// store returns a `Result` typed over this enum.
#[derive(Debug, Error)]
pub enum Error {
    /// A relative path escapes the backup root. Rejected before any I/O.
    #[error("path `{path}` escapes the backup root")]
    PathUnsafe {
        /// The offending path, as supplied by the caller.
        path: String,
    },

    /// The logical file or version is absent from the catalog.
    #[error("not found: {what}")]
    NotFound {
        /// Description of what could not be found (path, timestamp, ...).
        what: String,
    },

    /// A catalog entry exists but the on-disk blob it references is gone.
    #[error("blob missing for {hash} at {path}")]
    BlobMissing {
        /// Content hash the catalog recorded.
        hash: String,
        /// Path the blob was expected at.
        path: PathBuf,
    },

    /// Key-file unwrap failed authentication (wrong password).
    #[error("incorrect password or corrupt key file")]
    BadPassword,

    /// A restored plaintext hashes to something other than its recorded hash.
    #[error("corruption detected: expected hash {expected}, got {actual}")]
    CorruptionDetected {
        /// Hash recorded in the catalog.
        expected: String,
        /// Hash actually computed from the restored bytes.
        actual: String,
    },

    /// The transport peer went away mid-command.
    #[error("transport closed")]
    TransportClosed,

    /// A malformed frame, unknown command, or oversized frame.
    #[error("protocol error: {reason}")]
    ProtocolError {
        /// Human-readable description of the malformed frame or command.
        reason: String,
    },

    /// Another writer holds the advisory lock on the catalog file.
    #[error("catalog is locked by another process")]
    CatalogLocked,

    /// Wraps an underlying I/O failure (disk, file-lock, etc.) that does
    /// not map onto one of the named kinds above.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the stable taxonomy tag for this error, independent of the
    /// human-readable message. Used by the agent protocol to populate
    /// structured error responses (§4.J).
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PathUnsafe { .. } => ErrorKind::PathUnsafe,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::BlobMissing { .. } => ErrorKind::BlobMissing,
            Self::BadPassword => ErrorKind::BadPassword,
            Self::CorruptionDetected { .. } => ErrorKind::CorruptionDetected,
            Self::TransportClosed => ErrorKind::TransportClosed,
            Self::ProtocolError { .. } => ErrorKind::ProtocolError,
            Self::CatalogLocked => ErrorKind::CatalogLocked,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// The stable, `Copy` tag corresponding to each [`Error`] variant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// See [`Error::PathUnsafe`].
    PathUnsafe,
    /// See [`Error::NotFound`].
    NotFound,
    /// See [`Error::BlobMissing`].
    BlobMissing,
    /// See [`Error::BadPassword`].
    BadPassword,
    /// See [`Error::CorruptionDetected`].
    CorruptionDetected,
    /// See [`Error::TransportClosed`].
    TransportClosed,
    /// See [`Error::ProtocolError`].
    ProtocolError,
    /// See [`Error::CatalogLocked`].
    CatalogLocked,
    /// See [`Error::Io`].
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PathUnsafe => "path_unsafe",
            Self::NotFound => "not_found",
            Self::BlobMissing => "blob_missing",
            Self::BadPassword => "bad_password",
            Self::CorruptionDetected => "corruption_detected",
            Self::TransportClosed => "transport_closed",
            Self::ProtocolError => "protocol_error",
            Self::CatalogLocked => "catalog_locked",
            Self::Io => "io_error",
        };
        f.write_str(label)
    }
}

/// Convenience alias used throughout the version store crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = Error::BadPassword;
        assert_eq!(err.kind(), ErrorKind::BadPassword);
        assert_eq!(err.kind().to_string(), "bad_password");
    }

    #[test]
    fn io_error_converts_via_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn path_unsafe_message_includes_path() {
        let err = Error::PathUnsafe {
            path: "../etc/passwd".to_string(),
        };
        assert!(err.to_string().contains("../etc/passwd"));
    }
}
