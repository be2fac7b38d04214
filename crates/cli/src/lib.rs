//! # Overview
//!
//! Argument parsing and start-up resolution for the `verstore-agent`
//! binary (§4.K, §6). This crate owns everything that happens before
//! the agent can transition to `Ready`: parsing the command line,
//! loading or generating the envelope key file, unwrapping the master
//! key, and installing the requested logging verbosity. The request
//! dispatch loop itself — the agent protocol surface — lives in the
//! root binary crate, which depends on every engine crate directly.

pub mod args;
mod password;

use std::path::Path;

use core::config::AgentConfig;
use core::error::{Error, Result};

use cipher::keyfile::{KeyFile, KeyMode};
use cipher::key::MasterKey;
use logging::VerbosityConfig;

pub use args::{Cli, Command};
pub use password::{load_password_file, prompt_password, resolve_password};

#[cfg(test)]
pub use password::{set_password_prompt_input, set_password_stdin_input};

/// Everything the agent needs to start serving once the command line
/// has been parsed and validated.
pub struct Resolved {
    /// Validated backup-root/key-file/password triple.
    pub config: AgentConfig,
    /// The recovered master key. Always present: even with `--no-encrypt`
    /// (which only stops new blobs from being encrypted, via
    /// `pipeline_flags`), the key file must still unwrap successfully so
    /// the agent can decrypt any already-encrypted corpus.
    pub master_key: MasterKey,
    /// Logging verbosity derived from `-v`/`--info`/`--debug`.
    pub verbosity: VerbosityConfig,
    /// Pipeline feature flags: `(compress, encrypt, dedup)`.
    pub pipeline_flags: (bool, bool, bool),
}

/// Builds the verbosity configuration implied by `-v` plus any explicit
/// `--info`/`--debug` overrides (§4.K).
///
/// # Errors
///
/// Returns an error string if an `--info`/`--debug` token names an
/// unknown category or a malformed level suffix.
pub fn build_verbosity(cli: &Cli) -> std::result::Result<VerbosityConfig, String> {
    let mut verbosity = VerbosityConfig::from_verbose_level(cli.verbose);
    for token in &cli.info {
        verbosity.apply_info_flag(token)?;
    }
    for token in &cli.debug {
        verbosity.apply_debug_flag(token)?;
    }
    Ok(verbosity)
}

/// Resolves a fully parsed `Cli` into the inputs the agent needs to
/// serve: a validated [`AgentConfig`], the recovered master key, the
/// requested verbosity, and the pipeline feature flags. Prompts
/// interactively for the unlock password when the key file is wrapped
/// and neither `--password` nor `--password-file` was given.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the backup root or key file is
/// missing, [`Error::BadPassword`] if the key file cannot be unwrapped,
/// or [`Error::Io`] for any other failure loading the key file or
/// password.
pub fn resolve(cli: &Cli) -> Result<Resolved> {
    let verbosity =
        build_verbosity(cli).map_err(|reason| Error::ProtocolError { reason })?;

    let mut config = AgentConfig::new(&cli.backup_root, &cli.key_file);
    if let Some(password) = &cli.password {
        config = config.clone().with_password(password.clone());
    }
    config.validate()?;

    let key_file = KeyFile::load(&cli.key_file)?;
    let password = match key_file.mode() {
        KeyMode::Raw => None,
        KeyMode::Wrapped => {
            let password = resolve_password(
                cli.password.as_deref(),
                cli.password_file.as_deref(),
                "Unlock password: ",
            )?;
            if let Some(password) = &password {
                config = config.with_password(password.clone());
            }
            password
        }
    };

    let master_key = key_file
        .unwrap_key(password.as_deref())
        .map_err(|_| Error::BadPassword)?;

    Ok(Resolved {
        config,
        master_key,
        verbosity,
        pipeline_flags: cli.pipeline_flags(),
    })
}

/// Generates a new key file at `path`, wrapped under a password unless
/// `no_password` is set. Refuses to overwrite an existing key file.
///
/// # Errors
///
/// Returns [`Error::Io`] if `path` already exists or cannot be written.
pub fn init_key(path: &Path, no_password: bool, password: Option<String>) -> Result<()> {
    if path.exists() {
        return Err(Error::Io(std::io::Error::other(format!(
            "key file already exists at {}",
            path.display()
        ))));
    }

    let key_file = if no_password {
        KeyFile::generate_raw()
    } else {
        let password = match password {
            Some(password) => password,
            None => confirm_new_password("New unlock password: ", "Confirm password: ")?,
        };
        KeyFile::generate_wrapped(&password)
    };

    key_file.save(path)?;
    Ok(())
}

/// Rewraps the key file at `path` under a new password without
/// disturbing any stored ciphertext (§4.B, §10 redesign flag 2).
///
/// # Errors
///
/// Returns [`Error::BadPassword`] if `old_password` does not unlock the
/// existing key file, or [`Error::Io`] if the key file cannot be read or
/// written.
pub fn rotate_password(
    path: &Path,
    old_password: &str,
    new_password: Option<String>,
) -> Result<()> {
    let key_file = KeyFile::load(path)?;
    let new_password = match new_password {
        Some(password) => password,
        None => confirm_new_password("New unlock password: ", "Confirm new password: ")?,
    };

    let rotated = key_file
        .rotate(old_password, &new_password)
        .map_err(|_| Error::BadPassword)?;
    rotated.save(path)?;
    Ok(())
}

fn confirm_new_password(prompt: &str, confirm_prompt: &str) -> Result<String> {
    let first = prompt_password(prompt)?;
    let second = prompt_password(confirm_prompt)?;
    if first != second {
        return Err(Error::Io(std::io::Error::other(
            "password confirmation did not match",
        )));
    }
    Ok(first)
}
