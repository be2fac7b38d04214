//! # Overview
//!
//! The 256-bit master key (§3, §4.B). It lives in process memory only
//! for the lifetime of the running agent and is zeroized on drop — never
//! persisted in plaintext except transiently inside a `raw`-mode key
//! file, which the operator is responsible for protecting at rest.

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length in bytes of the master key (256 bits).
pub const MASTER_KEY_LEN: usize = 32;

/// A 256-bit master key, zeroized when dropped.
///
/// Implements neither `Debug` nor `Display` with the key material itself
/// to avoid it ending up in logs; [`MasterKey::fingerprint`] is the
/// deliberately lossy stand-in for diagnostics.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; MASTER_KEY_LEN]);

impl MasterKey {
    /// Wraps raw key bytes. Used when loading a `raw`-mode key file.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Generates a fresh random master key using the process CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; MASTER_KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Returns the raw key bytes. Callers must not persist or log this
    /// value outside of the key-file wrap/unwrap boundary.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey").finish_non_exhaustive()
    }
}
