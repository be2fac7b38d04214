//! Error type for the retention crate (§4.K).

use core::Error as CoreError;

/// Errors retention can raise while selecting or retiring versions.
#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    /// The catalog returned an error.
    #[error("catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    /// Removing a direct (non-deduplicated) blob failed.
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

impl From<RetentionError> for CoreError {
    fn from(err: RetentionError) -> Self {
        match err {
            RetentionError::Catalog(catalog_err) => catalog_err.into(),
            RetentionError::Store(store_err) => store_err.into(),
        }
    }
}

/// Convenience alias for fallible retention operations.
pub type Result<T> = std::result::Result<T, RetentionError>;
