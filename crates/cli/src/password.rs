//! Password loading helpers for the agent entry point.
//!
//! Centralises the three ways a user can supply the unlock password for
//! a wrapped key file (§4.B, §6): inline on the command line, from a
//! file (or standard input via `-`), or an interactive non-echoing
//! prompt. Keeps `lib.rs` free of `io`/terminal details.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use core::error::{Error, Result};

#[cfg(test)]
use std::cell::RefCell;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[cfg(test)]
thread_local! {
    static PASSWORD_STDIN_INPUT: RefCell<Option<Vec<u8>>> = const { RefCell::new(None) };
    static PASSWORD_PROMPT_INPUT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Resolves the unlock password for `verstore-agent` from, in order:
/// an inline `--password`, a `--password-file`, or an interactive
/// prompt. Returns `None` only when none of the three apply and the
/// caller should fall back to treating the key file as raw.
pub fn resolve_password(
    inline: Option<&str>,
    file: Option<&Path>,
    prompt: &str,
) -> Result<Option<String>> {
    if let Some(password) = inline {
        return Ok(Some(password.to_string()));
    }
    if let Some(path) = file {
        return load_password_file(path).map(Some);
    }
    prompt_password(prompt).map(Some)
}

/// Reads a password from `path`, enforcing the same owner-only
/// permission rule as the key file itself (§3), or from standard input
/// when `path` is `-`.
pub fn load_password_file(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut bytes = read_password_from_stdin()?;
        trim_trailing_newlines(&mut bytes);
        return String::from_utf8(bytes)
            .map_err(|err| Error::Io(io::Error::other(err.to_string())));
    }

    let metadata = fs::metadata(path)?;
    #[cfg(unix)]
    {
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(Error::Io(io::Error::other(format!(
                "password file {} must not be readable or writable by group/other (mode {mode:o})",
                path.display()
            ))));
        }
    }
    #[cfg(not(unix))]
    let _ = metadata;

    let mut bytes = fs::read(path)?;
    trim_trailing_newlines(&mut bytes);
    String::from_utf8(bytes).map_err(|err| Error::Io(io::Error::other(err.to_string())))
}

/// Prompts interactively without echoing input to the terminal.
pub fn prompt_password(prompt: &str) -> Result<String> {
    #[cfg(test)]
    if let Some(value) = take_password_prompt_input() {
        return Ok(value);
    }

    rpassword::prompt_password(prompt).map_err(|err| Error::Io(io::Error::other(err.to_string())))
}

fn read_password_from_stdin() -> Result<Vec<u8>> {
    #[cfg(test)]
    if let Some(bytes) = take_password_stdin_input() {
        return Ok(bytes);
    }

    let mut bytes = Vec::new();
    io::stdin().lock().read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn trim_trailing_newlines(bytes: &mut Vec<u8>) {
    while matches!(bytes.last(), Some(b'\n' | b'\r')) {
        bytes.pop();
    }
}

#[cfg(test)]
fn take_password_stdin_input() -> Option<Vec<u8>> {
    PASSWORD_STDIN_INPUT.with(|slot| slot.borrow_mut().take())
}

/// Installs bytes consumed by the next call to [`load_password_file`]
/// with `path == "-"`, for deterministic tests.
#[cfg(test)]
pub fn set_password_stdin_input(data: Vec<u8>) {
    PASSWORD_STDIN_INPUT.with(|slot| *slot.borrow_mut() = Some(data));
}

#[cfg(test)]
fn take_password_prompt_input() -> Option<String> {
    PASSWORD_PROMPT_INPUT.with(|slot| slot.borrow_mut().take())
}

/// Installs a value returned by the next call to [`prompt_password`],
/// for deterministic tests.
#[cfg(test)]
pub fn set_password_prompt_input(value: impl Into<String>) {
    PASSWORD_PROMPT_INPUT.with(|slot| *slot.borrow_mut() = Some(value.into()));
}
