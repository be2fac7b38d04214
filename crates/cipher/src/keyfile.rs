//! # Overview
//!
//! The on-disk envelope key file (§3, §6): a single JSON record holding
//! either a raw master key or a password-wrapped one, plus the KDF salt
//! and wrapping nonce needed to unwrap it.
//!
//! # Rotation
//!
//! [`KeyFile::rotate`] re-derives a key-encryption key under a fresh
//! random salt and re-wraps the unchanged master key under a fresh
//! random nonce. Nothing else on disk is touched: every blob ever
//! written under the old wrapping remains decryptable once the master
//! key has been recovered, because the master key itself never changes
//! (§4.B, §10 redesign flag 2).

use std::fs;
use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{CipherError, Result};
use crate::kdf::{derive_key_encryption_key, random_salt, SALT_LEN};
use crate::key::MasterKey;
use crate::stream::NONCE_LEN;

/// Key-file format version written by this implementation (§6).
pub const KEY_FILE_VERSION: &str = "3.0";
/// Algorithm tag written to the key file and checked on load.
pub const ALGORITHM: &str = "AES-256-GCM";

/// Whether the on-disk key is wrapped under a password-derived key or
/// stored raw (§3, §6).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    /// The master key is stored in the clear; no password is needed.
    Raw,
    /// The master key is wrapped under `AES-GCM(KDF(password, salt), nonce, key)`.
    Wrapped,
}

/// The on-disk key-file record of §6:
/// `{version, algorithm, mode, salt, nonce, key}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct KeyFileRecord {
    version: String,
    algorithm: String,
    mode: KeyMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    salt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<String>,
    key: String,
}

/// A loaded or freshly-generated envelope key file.
///
/// Holds only the encoded record; the master key is recovered by calling
/// [`KeyFile::unwrap_key`] with the appropriate password (or `None` for
/// raw mode), never cached on this struct.
#[derive(Clone, Debug)]
pub struct KeyFile {
    record: KeyFileRecord,
}

impl KeyFile {
    /// Generates a fresh key file holding a raw (unwrapped) master key.
    #[must_use]
    pub fn generate_raw() -> Self {
        let master_key = MasterKey::generate();
        Self {
            record: KeyFileRecord {
                version: KEY_FILE_VERSION.to_string(),
                algorithm: ALGORITHM.to_string(),
                mode: KeyMode::Raw,
                salt: None,
                nonce: None,
                key: BASE64.encode(master_key.as_bytes()),
            },
        }
    }

    /// Generates a fresh key file whose master key is wrapped under
    /// `password` with a new random salt and nonce.
    #[must_use]
    pub fn generate_wrapped(password: &str) -> Self {
        let master_key = MasterKey::generate();
        let salt = random_salt();
        Self::wrap(&master_key, password, &salt)
    }

    /// Reads and parses a key file from `path`. Does not recover the
    /// master key; call [`Self::unwrap_key`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Io`] if the file cannot be read, or
    /// [`CipherError::MalformedKeyFile`]/[`CipherError::UnsupportedKeyFile`]
    /// if its contents do not parse or name an unsupported mode.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let record: KeyFileRecord = serde_json::from_str(&contents)
            .map_err(|err| CipherError::MalformedKeyFile(err.to_string()))?;

        if record.algorithm != ALGORITHM {
            return Err(CipherError::UnsupportedKeyFile(record.algorithm));
        }

        Ok(Self { record })
    }

    /// Writes the key file to `path`, restricting permissions to the
    /// owner on Unix (`0600`), matching the on-disk requirement of §6.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let encoded = serde_json::to_string_pretty(&self.record)
            .map_err(|err| CipherError::MalformedKeyFile(err.to_string()))?;
        fs::write(path, encoded)?;
        restrict_to_owner(path)?;
        Ok(())
    }

    /// Returns the mode this key file was written in.
    #[must_use]
    pub const fn mode(&self) -> KeyMode {
        self.record.mode
    }

    /// Recovers the master key, given `password` for wrapped key files
    /// or `None` for raw ones.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::PasswordMismatch`] if a password was
    /// supplied for a raw key file or omitted for a wrapped one, and
    /// [`CipherError::AuthenticationFailed`] if an incorrect password is
    /// supplied for a wrapped key file.
    pub fn unwrap_key(&self, password: Option<&str>) -> Result<MasterKey> {
        match (self.record.mode, password) {
            (KeyMode::Raw, Some(_) | None) => decode_raw_key(&self.record.key),
            (KeyMode::Wrapped, None) => Err(CipherError::PasswordMismatch),
            (KeyMode::Wrapped, Some(password)) => self.unwrap_wrapped(password),
        }
    }

    /// Rewraps the master key under `new_password`, returning a fresh
    /// [`KeyFile`] with a new salt and nonce. No stored ciphertext
    /// anywhere else is touched — only this record changes (§4.B, §10).
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::AuthenticationFailed`] if `old_password` is
    /// wrong, or [`CipherError::PasswordMismatch`] if this key file is
    /// not in wrapped mode.
    pub fn rotate(&self, old_password: &str, new_password: &str) -> Result<Self> {
        if self.record.mode != KeyMode::Wrapped {
            return Err(CipherError::PasswordMismatch);
        }
        let master_key = self.unwrap_wrapped(old_password)?;
        let salt = random_salt();
        Ok(Self::wrap(&master_key, new_password, &salt))
    }

    fn unwrap_wrapped(&self, password: &str) -> Result<MasterKey> {
        let salt = self
            .record
            .salt
            .as_deref()
            .ok_or_else(|| CipherError::MalformedKeyFile("missing salt".to_string()))?;
        let nonce = self
            .record
            .nonce
            .as_deref()
            .ok_or_else(|| CipherError::MalformedKeyFile("missing nonce".to_string()))?;

        let salt_bytes = BASE64
            .decode(salt)
            .map_err(|err| CipherError::MalformedKeyFile(err.to_string()))?;
        let nonce_bytes = BASE64
            .decode(nonce)
            .map_err(|err| CipherError::MalformedKeyFile(err.to_string()))?;
        let wrapped_key = BASE64
            .decode(&self.record.key)
            .map_err(|err| CipherError::MalformedKeyFile(err.to_string()))?;

        let kek = derive_key_encryption_key(password, &salt_bytes);
        let cipher = Aes256Gcm::new_from_slice(kek.as_bytes())
            .map_err(|_| CipherError::MalformedKeyFile("invalid KEK length".to_string()))?;
        let nonce = Nonce::from_slice(&nonce_bytes);
        let plaintext = cipher
            .decrypt(nonce, wrapped_key.as_ref())
            .map_err(|_| CipherError::AuthenticationFailed)?;

        decode_raw_key(&BASE64.encode(&plaintext))
    }

    fn wrap(master_key: &MasterKey, password: &str, salt: &[u8]) -> Self {
        let kek = derive_key_encryption_key(password, salt);
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher =
            Aes256Gcm::new_from_slice(kek.as_bytes()).expect("derived KEK is always 32 bytes");
        let wrapped = cipher
            .encrypt(nonce, master_key.as_bytes().as_ref())
            .expect("encrypting a fixed-size master key cannot fail");

        Self {
            record: KeyFileRecord {
                version: KEY_FILE_VERSION.to_string(),
                algorithm: ALGORITHM.to_string(),
                mode: KeyMode::Wrapped,
                salt: Some(BASE64.encode(salt)),
                nonce: Some(BASE64.encode(nonce_bytes)),
                key: BASE64.encode(wrapped),
            },
        }
    }
}

fn decode_raw_key(encoded: &str) -> Result<MasterKey> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|err| CipherError::MalformedKeyFile(err.to_string()))?;
    let array: [u8; crate::key::MASTER_KEY_LEN] = bytes
        .try_into()
        .map_err(|_| CipherError::MalformedKeyFile("key is not 32 bytes".to_string()))?;
    Ok(MasterKey::from_bytes(array))
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_key_file_round_trips_without_password() {
        let key_file = KeyFile::generate_raw();
        let recovered = key_file.unwrap_key(None).unwrap();
        assert_eq!(recovered.as_bytes().len(), 32);
    }

    #[test]
    fn wrapped_key_file_requires_correct_password() {
        let key_file = KeyFile::generate_wrapped("hunter2");
        assert!(key_file.unwrap_key(Some("hunter2")).is_ok());

        let err = key_file.unwrap_key(Some("wrong")).unwrap_err();
        assert!(matches!(err, CipherError::AuthenticationFailed));
    }

    #[test]
    fn wrapped_key_file_without_password_is_mismatch() {
        let key_file = KeyFile::generate_wrapped("hunter2");
        let err = key_file.unwrap_key(None).unwrap_err();
        assert!(matches!(err, CipherError::PasswordMismatch));
    }

    #[test]
    fn rotation_preserves_master_key_material() {
        let key_file = KeyFile::generate_wrapped("p1");
        let before = key_file.unwrap_key(Some("p1")).unwrap();

        let rotated = key_file.rotate("p1", "p2").unwrap();
        let after = rotated.unwrap_key(Some("p2")).unwrap();

        assert_eq!(before.as_bytes(), after.as_bytes());
        assert!(rotated.unwrap_key(Some("p1")).is_err());
    }

    #[test]
    fn rotation_rejects_wrong_old_password() {
        let key_file = KeyFile::generate_wrapped("p1");
        let err = key_file.rotate("wrong", "p2").unwrap_err();
        assert!(matches!(err, CipherError::AuthenticationFailed));
    }

    #[test]
    fn rotation_uses_a_fresh_salt_and_nonce() {
        let key_file = KeyFile::generate_wrapped("p1");
        let rotated = key_file.rotate("p1", "p1").unwrap();
        assert_ne!(key_file.record.salt, rotated.record.salt);
        assert_ne!(key_file.record.nonce, rotated.record.nonce);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");

        let key_file = KeyFile::generate_wrapped("hunter2");
        key_file.save(&path).unwrap();

        let loaded = KeyFile::load(&path).unwrap();
        assert_eq!(loaded.mode(), KeyMode::Wrapped);
        let recovered = loaded.unwrap_key(Some("hunter2")).unwrap();
        let expected = key_file.unwrap_key(Some("hunter2")).unwrap();
        assert_eq!(recovered.as_bytes(), expected.as_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn save_restricts_permissions_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        KeyFile::generate_raw().save(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn load_rejects_unsupported_algorithm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");
        fs::write(
            &path,
            r#"{"version":"3.0","algorithm":"ROT13","mode":"raw","key":"AA=="}"#,
        )
        .unwrap();

        let err = KeyFile::load(&path).unwrap_err();
        assert!(matches!(err, CipherError::UnsupportedKeyFile(_)));
    }
}
