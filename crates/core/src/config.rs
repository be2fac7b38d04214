//! # Overview
//!
//! Agent start-up configuration (§4.K, §6): the three ambient inputs the
//! agent process is handed before it can transition to `Ready` — the
//! backup root, the key-file path, and an optional unlock password.
//!
//! This is deliberately not a config-file parser; loading `*.toml`/`*.yaml`
//! operator configuration is the outer CLI's job (§1 Out of scope). What
//! lives here is the narrow struct the agent actually runs on, and the
//! validation that must pass before it is handed to the rest of the
//! version store.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable carrying the backup root path.
pub const ENV_BACKUP_ROOT: &str = "VERSTORE_BACKUP_ROOT";
/// Environment variable carrying the key-file path.
pub const ENV_KEY_FILE: &str = "VERSTORE_KEY_FILE";
/// Environment variable carrying the unlock password, if any.
pub const ENV_PASSWORD: &str = "VERSTORE_PASSWORD";

/// The ambient inputs an agent process needs before serving requests.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Root directory of the backup tree (§3).
    pub backup_root: PathBuf,
    /// Path to the key file (§4.B, §6).
    pub key_file: PathBuf,
    /// Optional password unlocking a wrapped master key. `None` means
    /// the key file holds a raw (unwrapped) master key.
    pub password: Option<String>,
}

impl AgentConfig {
    /// Builds a configuration explicitly, without touching the process
    /// environment. Preferred from tests and from a CLI that has already
    /// parsed its own arguments.
    #[must_use]
    pub fn new(backup_root: impl Into<PathBuf>, key_file: impl Into<PathBuf>) -> Self {
        Self {
            backup_root: backup_root.into(),
            key_file: key_file.into(),
            password: None,
        }
    }

    /// Attaches a password, consumed from an unlock prompt or environment
    /// variable.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Reads the three ambient inputs from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `VERSTORE_BACKUP_ROOT` or
    /// `VERSTORE_KEY_FILE` is unset.
    pub fn from_env() -> Result<Self> {
        let backup_root = env::var(ENV_BACKUP_ROOT).map_err(|_| Error::NotFound {
            what: format!("environment variable {ENV_BACKUP_ROOT}"),
        })?;
        let key_file = env::var(ENV_KEY_FILE).map_err(|_| Error::NotFound {
            what: format!("environment variable {ENV_KEY_FILE}"),
        })?;
        let password = env::var(ENV_PASSWORD).ok();

        Ok(Self {
            backup_root: PathBuf::from(backup_root),
            key_file: PathBuf::from(key_file),
            password,
        })
    }

    /// Validates that the backup root exists (creating it if absent) and
    /// that the key file is present and, on Unix, restricted to owner
    /// access. This runs once at start-up, before the agent transitions
    /// to `Ready` (§4.K).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the backup root cannot be created, or
    /// [`Error::NotFound`] if the key file does not exist.
    pub fn validate(&self) -> Result<()> {
        if !self.backup_root.exists() {
            std::fs::create_dir_all(&self.backup_root)?;
        }

        if !self.key_file.exists() {
            return Err(Error::NotFound {
                what: format!("key file at {}", self.key_file.display()),
            });
        }

        check_owner_only_permissions(&self.key_file)?;
        Ok(())
    }
}

/// Rejects a key file that is readable or writable by group or other on
/// Unix. Mirrors the on-disk permission invariant of §3 ("restricted to
/// the owner, 0600").
#[cfg(unix)]
fn check_owner_only_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(Error::Io(std::io::Error::other(format!(
            "key file {} must not be readable or writable by group/other (mode {mode:o})",
            path.display()
        ))));
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_owner_only_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
