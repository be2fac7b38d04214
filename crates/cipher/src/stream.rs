//! # Overview
//!
//! AES-256-GCM encryption of arbitrary byte streams under the master key
//! (§4.B). On-disk layout is `nonce ‖ ciphertext_and_tag`: a 96-bit
//! random nonce followed by the AEAD output, with no associated data.
//!
//! # Examples
//!
//! ```
//! use cipher::key::MasterKey;
//! use cipher::stream::{encrypt, decrypt};
//! use std::io::Cursor;
//!
//! let key = MasterKey::generate();
//! let mut ciphertext = Vec::new();
//! encrypt(Cursor::new(b"secret payload"), &mut ciphertext, &key).unwrap();
//!
//! let mut plaintext = Vec::new();
//! decrypt(Cursor::new(&ciphertext), &mut plaintext, &key).unwrap();
//! assert_eq!(plaintext, b"secret payload");
//! ```

use std::io::{self, Read, Write};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;

use crate::error::{CipherError, Result};
use crate::key::MasterKey;

/// Length in bytes of the random AES-GCM nonce (96 bits).
pub const NONCE_LEN: usize = 12;

/// Encrypts `input` under `key`, writing `nonce ‖ ciphertext_and_tag` to
/// `out` (§4.B).
///
/// # Errors
///
/// Returns [`CipherError::Io`] if `input` or `out` fail. AEAD encryption
/// itself cannot fail for well-formed input.
pub fn encrypt<R: Read, W: Write>(mut input: R, out: &mut W, key: &MasterKey) -> Result<()> {
    let mut plaintext = Vec::new();
    input.read_to_end(&mut plaintext)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| CipherError::MalformedKeyFile("invalid key length".to_string()))?;
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_ref())
        .map_err(|_| CipherError::AuthenticationFailed)?;

    out.write_all(&nonce_bytes)?;
    out.write_all(&ciphertext)?;
    Ok(())
}

/// Decrypts a stream produced by [`encrypt`].
///
/// # Errors
///
/// Returns [`CipherError::AuthenticationFailed`] if the tag does not
/// verify (wrong key or corrupt ciphertext), and [`CipherError::Io`] for
/// I/O failures or a stream shorter than the nonce.
pub fn decrypt<R: Read, W: Write>(mut input: R, out: &mut W, key: &MasterKey) -> Result<()> {
    let mut framed = Vec::new();
    input.read_to_end(&mut framed)?;

    if framed.len() < NONCE_LEN {
        return Err(CipherError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "ciphertext shorter than nonce",
        )));
    }

    let (nonce_bytes, ciphertext) = framed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| CipherError::MalformedKeyFile("invalid key length".to_string()))?;
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CipherError::AuthenticationFailed)?;

    out.write_all(&plaintext)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip_preserves_plaintext() {
        let key = MasterKey::generate();
        let data = b"The quick brown fox jumps over the lazy dog".repeat(5);
        let mut ciphertext = Vec::new();
        encrypt(Cursor::new(&data), &mut ciphertext, &key).unwrap();

        let mut plaintext = Vec::new();
        decrypt(Cursor::new(&ciphertext), &mut plaintext, &key).unwrap();
        assert_eq!(plaintext, data);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let key = MasterKey::generate();
        let wrong_key = MasterKey::generate();
        let mut ciphertext = Vec::new();
        encrypt(Cursor::new(b"secret"), &mut ciphertext, &key).unwrap();

        let mut plaintext = Vec::new();
        let result = decrypt(Cursor::new(&ciphertext), &mut plaintext, &wrong_key);
        assert!(matches!(result, Err(CipherError::AuthenticationFailed)));
    }

    #[test]
    fn nonce_differs_across_calls() {
        let key = MasterKey::generate();
        let mut first = Vec::new();
        let mut second = Vec::new();
        encrypt(Cursor::new(b"same payload"), &mut first, &key).unwrap();
        encrypt(Cursor::new(b"same payload"), &mut second, &key).unwrap();
        assert_ne!(&first[..NONCE_LEN], &second[..NONCE_LEN]);
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let key = MasterKey::generate();
        let mut ciphertext = Vec::new();
        encrypt(Cursor::new(b"secret payload"), &mut ciphertext, &key).unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;

        let mut plaintext = Vec::new();
        let result = decrypt(Cursor::new(&ciphertext), &mut plaintext, &key);
        assert!(result.is_err());
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let mut plaintext = Vec::new();
        let key = MasterKey::generate();
        let result = decrypt(Cursor::new(b"short"), &mut plaintext, &key);
        assert!(result.is_err());
    }
}
