//! # Overview
//!
//! Password-based key derivation for the envelope-wrapped master key
//! (§4.B): PBKDF2-HMAC-SHA-256 with 100,000 iterations and a random
//! per-keyfile salt.
//!
//! # Redesign
//!
//! The original prototype derived this key from a hardcoded literal
//! salt, making every installation's derivation identical modulo
//! password. This module never accepts a caller-supplied salt for
//! wrapping — [`random_salt`] is the only source — closing that off
//! structurally rather than by convention.

use rand::RngCore;

use crate::key::MasterKey;

/// Length in bytes of the PBKDF2 salt.
pub const SALT_LEN: usize = 16;
/// PBKDF2-HMAC-SHA-256 iteration count (§4.B).
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Generates a fresh random salt for wrapping a master key.
#[must_use]
pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Derives a 256-bit key-encryption key from `password` and `salt` using
/// PBKDF2-HMAC-SHA-256 at [`PBKDF2_ITERATIONS`] iterations.
#[must_use]
pub fn derive_key_encryption_key(password: &str, salt: &[u8]) -> MasterKey {
    let mut derived = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<sha2::Sha256>(
        password.as_bytes(),
        salt,
        PBKDF2_ITERATIONS,
        &mut derived,
    );
    MasterKey::from_bytes(derived)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_password_and_salt_derive_identically() {
        let salt = random_salt();
        let a = derive_key_encryption_key("hunter2", &salt);
        let b = derive_key_encryption_key("hunter2", &salt);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_salts_derive_different_keys() {
        let a = derive_key_encryption_key("hunter2", &random_salt());
        let b = derive_key_encryption_key("hunter2", &random_salt());
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn different_passwords_derive_different_keys() {
        let salt = random_salt();
        let a = derive_key_encryption_key("hunter2", &salt);
        let b = derive_key_encryption_key("correct-horse", &salt);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn random_salt_is_not_fixed() {
        let a = random_salt();
        let b = random_salt();
        assert_ne!(a, b, "salts must not collide across calls");
    }
}
