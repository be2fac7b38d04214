//! Error type for the garbage collector (§4.K).

use core::Error as CoreError;

/// Errors the garbage collector can raise while reconciling and
/// reclaiming dedup objects.
#[derive(Debug, thiserror::Error)]
pub enum GcError {
    /// The catalog returned an error.
    #[error("catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    /// The store returned an error while removing a blob.
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
}

impl From<GcError> for CoreError {
    fn from(err: GcError) -> Self {
        match err {
            GcError::Catalog(catalog_err) => catalog_err.into(),
            GcError::Store(store_err) => store_err.into(),
        }
    }
}

/// Convenience alias for fallible GC operations.
pub type Result<T> = std::result::Result<T, GcError>;
