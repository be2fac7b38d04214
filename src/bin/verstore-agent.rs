//! Entry point for the version store agent (§1, §4.K, §6).
//!
//! Parses the command line, then either runs a maintenance subcommand
//! against the key file directly or resolves the full start-up
//! configuration and serves the agent protocol over stdin/stdout. All
//! dispatch logic lives in [`dispatch`]; this file only wires the
//! ambient inputs together and maps the outcome to an exit code.

mod convert;
mod dispatch;

use std::path::Path;

use clap::Parser;

use catalog::Catalog;
use cli::{Cli, Command};
use pipeline::PipelineOptions;
use restore::Restore;

fn main() {
    let cli = Cli::parse();
    std::process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    match &cli.command {
        Some(Command::InitKey { no_password }) => run_init_key(cli, *no_password),
        Some(Command::RotatePassword { new_password }) => {
            run_rotate_password(cli, new_password.clone())
        }
        Some(Command::Restore {
            path,
            timestamp,
            destination,
        }) => run_restore(cli, path, timestamp.as_deref(), destination),
        None | Some(Command::Serve) => run_serve(cli),
    }
}

fn run_init_key(cli: &Cli, no_password: bool) -> i32 {
    match cli::init_key(&cli.key_file, no_password, cli.password.clone()) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("verstore-agent: {err}");
            2
        }
    }
}

fn run_rotate_password(cli: &Cli, new_password: Option<String>) -> i32 {
    let old_password = match cli::resolve_password(
        cli.password.as_deref(),
        cli.password_file.as_deref(),
        "Current unlock password: ",
    ) {
        Ok(Some(password)) => password,
        Ok(None) => {
            eprintln!("verstore-agent: a current password is required to rotate");
            return 2;
        }
        Err(err) => {
            eprintln!("verstore-agent: {err}");
            return 2;
        }
    };

    match cli::rotate_password(&cli.key_file, &old_password, new_password) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("verstore-agent: {err}");
            2
        }
    }
}

fn run_restore(cli: &Cli, path: &str, timestamp: Option<&str>, destination: &Path) -> i32 {
    let resolved = match cli::resolve(cli) {
        Ok(resolved) => resolved,
        Err(err) => {
            eprintln!("verstore-agent: {err}");
            return 2;
        }
    };

    let catalog = match Catalog::open(&resolved.config.backup_root) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("verstore-agent: {err}");
            return 2;
        }
    };

    let restore = Restore::new(&catalog, &resolved.config.backup_root, Some(&resolved.master_key));
    let result = match timestamp {
        Some(timestamp) => restore.restore_version(path, timestamp, destination),
        None => restore.restore_latest(path, destination),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("verstore-agent: {err}");
            2
        }
    }
}

fn run_serve(cli: &Cli) -> i32 {
    let resolved = match cli::resolve(cli) {
        Ok(resolved) => resolved,
        Err(err) => {
            eprintln!("verstore-agent: {err}");
            return 2;
        }
    };

    logging::init(resolved.verbosity);

    let catalog = match Catalog::open(&resolved.config.backup_root) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("verstore-agent: {err}");
            return 2;
        }
    };

    let (compress, encrypt, dedup) = resolved.pipeline_flags;
    let options = PipelineOptions {
        compress,
        encrypt,
        dedup,
    };

    match dispatch::serve(&catalog, &resolved.config.backup_root, &resolved.master_key, options) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("verstore-agent: {err}");
            1
        }
    }
}
