//! Catalog-crate-local error type, mapped into [`core::error::Error`] at
//! the boundary the rest of the version store calls through.

use thiserror::Error;

/// Errors raised while opening or querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Another process holds the advisory lock on the catalog file.
    #[error("catalog is locked by another process")]
    Locked,

    /// The requested file version or dedup object is not present.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying SQLite failure.
    #[error("catalog database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Underlying I/O failure (opening the database file, the advisory
    /// lock sidecar, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CatalogError> for core::error::Error {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Locked => Self::CatalogLocked,
            CatalogError::NotFound(what) => Self::NotFound { what },
            CatalogError::Io(io_err) => Self::Io(io_err),
            CatalogError::Database(db_err) => Self::Io(std::io::Error::other(db_err.to_string())),
        }
    }
}

/// Convenience alias for catalog-crate fallible operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
