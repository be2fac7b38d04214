//! Cipher-crate-local error type, mapped into [`core::error::Error`] at
//! the call sites that cross into the rest of the version store.

use thiserror::Error;

/// Errors raised while wrapping, unwrapping, or using the master key.
#[derive(Debug, Error)]
pub enum CipherError {
    /// AEAD authentication failed while unwrapping the master key or
    /// decrypting an object — almost always an incorrect password
    /// (§4.B, §7 `BadPassword`).
    #[error("authentication failed: incorrect password or corrupt ciphertext")]
    AuthenticationFailed,

    /// The key file's JSON envelope could not be parsed.
    #[error("malformed key file: {0}")]
    MalformedKeyFile(String),

    /// An unsupported `algorithm` or `mode` tag was found in the key
    /// file.
    #[error("unsupported key file algorithm or mode: {0}")]
    UnsupportedKeyFile(String),

    /// A wrapped key file was loaded without a password, or a raw key
    /// file was loaded with one.
    #[error("password required but not supplied, or supplied but not required")]
    PasswordMismatch,

    /// Underlying I/O failure reading or writing the key file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CipherError> for core::error::Error {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::AuthenticationFailed => Self::BadPassword,
            CipherError::Io(io_err) => Self::Io(io_err),
            other => Self::Io(std::io::Error::other(other.to_string())),
        }
    }
}

/// Convenience alias for cipher-crate fallible operations.
pub type Result<T> = std::result::Result<T, CipherError>;
