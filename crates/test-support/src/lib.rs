#![deny(unsafe_code)]

//! # Overview
//!
//! Shared test fixtures for the version store workspace: a temporary
//! backup root with the standard subtrees already created, handed out to
//! integration tests across `pipeline`, `restore`, `gc`, and friends so
//! each crate doesn't reinvent the same boilerplate.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary backup root, alive for the lifetime of the value. Dropped
/// at the end of a test, which removes the whole tree.
pub struct TempBackupRoot {
    dir: TempDir,
}

impl TempBackupRoot {
    /// Creates a fresh temporary backup root with `current/`, `versions/`,
    /// and `dedup_store/` already present.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or its subtrees cannot be
    /// created; acceptable in test code only.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        for subtree in ["current", "versions", "dedup_store"] {
            fs::create_dir_all(dir.path().join(subtree)).expect("create subtree");
        }
        Self { dir }
    }

    /// The backup root's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to a fresh temp file inside the root, suitable
    /// as a pipeline source file, returning its path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written; acceptable in test code
    /// only.
    #[must_use]
    pub fn write_source_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(format!("_source_{name}"));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create source parent");
        }
        fs::write(&path, contents).expect("write source file");
        path
    }
}

impl Default for TempBackupRoot {
    fn default() -> Self {
        Self::new()
    }
}
