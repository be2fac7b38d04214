//! Command-line surface of the version store agent (§4.K, §6).
//!
//! This is intentionally narrow: the three ambient start-up inputs named
//! in §6 (backup root, key file, unlock password), the verbosity flags
//! of §4.K, and the handful of maintenance subcommands that operate
//! directly on a backup root without going through the wire protocol
//! (key generation, password rotation). Everything else — the actual
//! `save_version`/`restore`/`prune`/`gc` surface — is the agent
//! protocol's (§4.J), reached over stdin/stdout once `serve` starts.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parsed command line for `verstore-agent`.
#[derive(Debug, Parser)]
#[command(name = "verstore-agent", version, about = "Version store agent: serves the agent protocol over a single connection")]
pub struct Cli {
    /// Root directory of the backup tree (§3, §6).
    #[arg(long, env = "VERSTORE_BACKUP_ROOT")]
    pub backup_root: PathBuf,

    /// Path to the envelope key file (§4.B, §6).
    #[arg(long, env = "VERSTORE_KEY_FILE")]
    pub key_file: PathBuf,

    /// Unlock password for a password-wrapped key file. Omit to be
    /// prompted interactively, or supply `--password-file` instead.
    #[arg(long, env = "VERSTORE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Read the unlock password from this file instead of a prompt
    /// (`-` reads from standard input). Trailing newlines are trimmed.
    #[arg(long, conflicts_with = "password")]
    pub password_file: Option<PathBuf>,

    /// Increase logging verbosity; repeatable (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Enable one informational category explicitly, e.g.
    /// `--info=save2` or `--info=ALL`. May be repeated.
    #[arg(long = "info", value_name = "FLAG[LEVEL]")]
    pub info: Vec<String>,

    /// Enable one debug category explicitly, e.g. `--debug=catalog1`.
    /// May be repeated.
    #[arg(long = "debug", value_name = "FLAG[LEVEL]")]
    pub debug: Vec<String>,

    /// Disable content-addressed deduplication for new saves.
    #[arg(long)]
    pub no_dedup: bool,

    /// Disable gzip compression for new saves.
    #[arg(long)]
    pub no_compress: bool,

    /// Disable AES-256-GCM encryption for new saves (the master key is
    /// still required to decrypt any existing encrypted corpus).
    #[arg(long)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands beyond the default `serve` (§6 "Client-visible CLI
/// contract").
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the agent protocol over stdin/stdout (the default).
    Serve,
    /// Generate a fresh key file at `--key-file`.
    InitKey {
        /// Write a raw (unwrapped) master key instead of prompting for
        /// a password to wrap it under.
        #[arg(long)]
        no_password: bool,
    },
    /// Rewrap the master key under a new password without touching any
    /// stored ciphertext (§4.B "Rotation").
    RotatePassword {
        /// New password. Omit to be prompted interactively.
        #[arg(long)]
        new_password: Option<String>,
    },
    /// Restores one version of a logical path directly against the
    /// backup root (§4.G). Unlike the other commands, this never goes
    /// over the agent protocol: restoration is an operator action run
    /// on the machine holding the backup root, not a client command.
    Restore {
        /// Logical path to restore.
        path: String,
        /// Specific version timestamp to restore. Omits to the latest
        /// version of `path`.
        #[arg(long)]
        timestamp: Option<String>,
        /// File to write the restored plaintext to.
        #[arg(long)]
        destination: PathBuf,
    },
}

impl Cli {
    /// The pipeline options these flags imply, defaulting to every
    /// stage enabled (§1, §4.F).
    #[must_use]
    pub const fn pipeline_flags(&self) -> (bool, bool, bool) {
        (!self.no_compress, !self.no_encrypt, !self.no_dedup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_required_arguments() {
        let cli = Cli::parse_from([
            "verstore-agent",
            "--backup-root",
            "/backups/root",
            "--key-file",
            "/backups/root/key.json",
        ]);
        assert_eq!(cli.backup_root, PathBuf::from("/backups/root"));
        assert_eq!(cli.key_file, PathBuf::from("/backups/root/key.json"));
        assert!(cli.password.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn repeated_verbose_flag_accumulates() {
        let cli = Cli::parse_from([
            "verstore-agent",
            "--backup-root",
            "/root",
            "--key-file",
            "/root/key.json",
            "-vvv",
        ]);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn pipeline_flags_default_to_everything_enabled() {
        let cli = Cli::parse_from([
            "verstore-agent",
            "--backup-root",
            "/root",
            "--key-file",
            "/root/key.json",
        ]);
        assert_eq!(cli.pipeline_flags(), (true, true, true));
    }

    #[test]
    fn no_encrypt_flag_disables_only_encryption() {
        let cli = Cli::parse_from([
            "verstore-agent",
            "--backup-root",
            "/root",
            "--key-file",
            "/root/key.json",
            "--no-encrypt",
        ]);
        assert_eq!(cli.pipeline_flags(), (true, false, true));
    }

    #[test]
    fn restore_subcommand_parses_optional_timestamp() {
        let cli = Cli::parse_from([
            "verstore-agent",
            "--backup-root",
            "/root",
            "--key-file",
            "/root/key.json",
            "restore",
            "docs/a.txt",
            "--destination",
            "/tmp/a.txt",
        ]);
        match cli.command {
            Some(Command::Restore {
                path,
                timestamp,
                destination,
            }) => {
                assert_eq!(path, "docs/a.txt");
                assert!(timestamp.is_none());
                assert_eq!(destination, PathBuf::from("/tmp/a.txt"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn init_key_subcommand_parses() {
        let cli = Cli::parse_from([
            "verstore-agent",
            "--backup-root",
            "/root",
            "--key-file",
            "/root/key.json",
            "init-key",
            "--no-password",
        ]);
        assert!(matches!(
            cli.command,
            Some(Command::InitKey { no_password: true })
        ));
    }
}
