#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `catalog` is component D of the version store: the durable SQLite
//! metadata index of file versions and dedup objects (§3, §4.D), guarded
//! by an advisory file lock so that the pipeline, retention, and GC
//! never race each other's commits across processes (§5).
//!
//! # See also
//!
//! - [`records`] for the [`FileVersion`] and [`DedupObject`] record types.
//! - [`schema`] for table creation and additive migration.

pub mod error;
pub mod records;
mod schema;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use rusqlite::{params, Connection, OptionalExtension};

pub use error::{CatalogError, Result};
pub use records::{Action, DedupObject, EncryptionMetadata, FileVersion, StorageDescriptor};

/// Summary statistics over the whole catalog, returned by the agent's
/// `get_stats` command (§4.J).
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    /// Total number of file-version records across all paths.
    pub total_versions: u64,
    /// Number of distinct logical paths with at least one version.
    pub total_paths: u64,
    /// Number of unique dedup objects.
    pub total_dedup_objects: u64,
    /// Sum of every dedup object's `stored_size`: actual bytes on disk
    /// for the dedup store, independent of how many versions share them.
    pub dedup_store_bytes: u64,
    /// Sum of every version's `plaintext_size`, the logical (undeduped,
    /// uncompressed) size of everything ever saved.
    pub logical_bytes: u64,
}

/// A held advisory lock on the catalog's sidecar lock file (§4.K, §5).
/// Released when dropped.
pub struct CatalogLock {
    file: File,
}

impl Drop for CatalogLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// The durable metadata catalog: a SQLite database at
/// `<backup_root>/catalog.db`, plus the sidecar lock file coordinating
/// cross-process writers (§3, §4.D, §5).
pub struct Catalog {
    conn: Connection,
    lock_path: PathBuf,
}

impl Catalog {
    /// Opens (creating if absent) the catalog at `backup_root/catalog.db`,
    /// applying schema migration (§4.D).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the database cannot be
    /// opened or migrated.
    pub fn open(backup_root: &Path) -> Result<Self> {
        let db_path = backup_root.join("catalog.db");
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::migrate(&conn)?;

        Ok(Self {
            conn,
            lock_path: backup_root.join("catalog.db.lock"),
        })
    }

    /// Opens a catalog backed by an in-memory database, for tests that
    /// don't need a real backup root.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] if the in-memory database
    /// cannot be created or migrated.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn)?;
        let lock_file = tempfile::NamedTempFile::new()?;
        // Keep the sidecar file alive for the catalog's lifetime by
        // leaking its path; tests that use this constructor never need
        // the lock file cleaned up before process exit.
        let lock_path = lock_file
            .into_temp_path()
            .keep()
            .map_err(|err| CatalogError::Io(err.error))?;
        Ok(Self { conn, lock_path })
    }

    /// Attempts to take the advisory lock on this catalog, without
    /// blocking. Callers that must coordinate a mutation across
    /// processes (pipeline commits, retention, GC) hold this for the
    /// minimum necessary span (§5).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Locked`] if another process already holds
    /// the lock, and [`CatalogError::Io`] if the sidecar file cannot be
    /// opened.
    pub fn try_lock(&self) -> Result<CatalogLock> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        if let Err(err) = file.try_lock_exclusive() {
            tracing::warn!(lock_path = %self.lock_path.display(), %err, "catalog already locked by another process");
            return Err(CatalogError::Locked);
        }
        Ok(CatalogLock { file })
    }

    /// Inserts a new, immutable file-version record (§3, §4.F).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on constraint violation or
    /// other SQLite failure.
    pub fn insert_file_version(&self, version: &FileVersion) -> Result<()> {
        let (dedup_ref, blob_path) = match &version.storage {
            StorageDescriptor::DedupRef(hash) => (Some(hash.as_str()), None),
            StorageDescriptor::BlobPath(path) => (None, Some(path.as_str())),
        };
        let nonce = version.encryption.as_ref().map(|meta| meta.nonce.as_str());

        self.conn.execute(
            "INSERT INTO file_versions
                (path, timestamp, plaintext_size, plaintext_hash, action,
                 dedup_ref, blob_path, compressed, encrypted, encryption_nonce, stored_size)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                version.path,
                version.timestamp,
                version.plaintext_size,
                version.plaintext_hash,
                version.action.as_str(),
                dedup_ref,
                blob_path,
                version.compressed,
                version.encrypted,
                nonce,
                version.stored_size,
            ],
        )?;
        tracing::debug!(path = version.path, timestamp = %version.timestamp, action = version.action.as_str(), "inserted file-version record");
        Ok(())
    }

    /// Fetches one version by its `(path, timestamp)` identity.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn get_version(&self, path: &str, timestamp: &str) -> Result<Option<FileVersion>> {
        self.conn
            .query_row(
                "SELECT path, timestamp, plaintext_size, plaintext_hash, action,
                        dedup_ref, blob_path, compressed, encrypted, encryption_nonce, stored_size
                 FROM file_versions WHERE path = ?1 AND timestamp = ?2",
                params![path, timestamp],
                row_to_file_version,
            )
            .optional()
            .map_err(CatalogError::from)
    }

    /// Lists every version of `path`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn list_versions(&self, path: &str) -> Result<Vec<FileVersion>> {
        let mut statement = self.conn.prepare(
            "SELECT path, timestamp, plaintext_size, plaintext_hash, action,
                    dedup_ref, blob_path, compressed, encrypted, encryption_nonce, stored_size
             FROM file_versions WHERE path = ?1 ORDER BY timestamp DESC",
        )?;
        let rows = statement
            .query_map(params![path], row_to_file_version)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// The most recent version of `path`, if any. Used as the
    /// [`core::BaselineProvider`] lookup and by the pipeline's no-op
    /// fast path.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn latest_version(&self, path: &str) -> Result<Option<FileVersion>> {
        self.conn
            .query_row(
                "SELECT path, timestamp, plaintext_size, plaintext_hash, action,
                        dedup_ref, blob_path, compressed, encrypted, encryption_nonce, stored_size
                 FROM file_versions WHERE path = ?1 ORDER BY timestamp DESC LIMIT 1",
                params![path],
                row_to_file_version,
            )
            .optional()
            .map_err(CatalogError::from)
    }

    /// Deletes one version record by identity, used by retention (§4.H).
    /// Does not touch dedup ref-counts or blobs; callers are responsible
    /// for that bookkeeping before or after calling this.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn delete_version(&self, path: &str, timestamp: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM file_versions WHERE path = ?1 AND timestamp = ?2",
            params![path, timestamp],
        )?;
        tracing::debug!(path, timestamp, "retired file-version record");
        Ok(())
    }

    /// Lists every distinct logical path with at least one version, used
    /// by `prune` over the whole catalog (§4.H) and the GC drift scan.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn list_paths(&self) -> Result<Vec<String>> {
        let mut statement = self
            .conn
            .prepare("SELECT DISTINCT path FROM file_versions")?;
        let rows = statement
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Fetches a dedup object by its content hash.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn get_dedup(&self, hash: &str) -> Result<Option<DedupObject>> {
        self.conn
            .query_row(
                "SELECT hash, blob_path, original_size, stored_size, compressed,
                        encrypted, encryption_nonce, ref_count
                 FROM dedup_store WHERE hash = ?1",
                params![hash],
                row_to_dedup_object,
            )
            .optional()
            .map_err(CatalogError::from)
    }

    /// Inserts a new dedup object with `ref_count = 1` (§4.F "miss").
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on constraint violation or
    /// other SQLite failure.
    pub fn insert_dedup(&self, object: &DedupObject) -> Result<()> {
        let nonce = object.encryption.as_ref().map(|meta| meta.nonce.as_str());
        self.conn.execute(
            "INSERT INTO dedup_store
                (hash, blob_path, original_size, stored_size, compressed,
                 encrypted, encryption_nonce, ref_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                object.hash,
                object.blob_path,
                object.original_size,
                object.stored_size,
                object.compressed,
                object.encrypted,
                nonce,
                object.ref_count,
            ],
        )?;
        tracing::debug!(hash = object.hash, "inserted dedup object");
        Ok(())
    }

    /// Increments the ref count of the dedup object keyed by `hash`
    /// (§4.F "hit").
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn increment_ref_count(&self, hash: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE dedup_store SET ref_count = ref_count + 1 WHERE hash = ?1",
            params![hash],
        )?;
        Ok(())
    }

    /// Decrements the ref count of the dedup object keyed by `hash`,
    /// used by retention when retiring a deduplicated version (§4.H).
    /// Never deletes the blob directly — only GC does that (§4.H, §4.I).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn decrement_ref_count(&self, hash: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE dedup_store SET ref_count = ref_count - 1 WHERE hash = ?1",
            params![hash],
        )?;
        Ok(())
    }

    /// Overwrites the ref count of the dedup object keyed by `hash`,
    /// used by GC's drift repair (§4.I.2).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn set_ref_count(&self, hash: &str, count: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE dedup_store SET ref_count = ?2 WHERE hash = ?1",
            params![hash, count],
        )?;
        Ok(())
    }

    /// Deletes a dedup object record, used by GC once its blob has been
    /// removed from disk (§4.I.3).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn delete_dedup(&self, hash: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM dedup_store WHERE hash = ?1", params![hash])?;
        tracing::debug!(hash, "deleted dedup object record");
        Ok(())
    }

    /// Lists every dedup object whose recorded `ref_count` is `<= 0`,
    /// the GC's candidate set (§4.I.1).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn dedup_objects_with_nonpositive_ref_count(&self) -> Result<Vec<DedupObject>> {
        let mut statement = self.conn.prepare(
            "SELECT hash, blob_path, original_size, stored_size, compressed,
                    encrypted, encryption_nonce, ref_count
             FROM dedup_store WHERE ref_count <= 0",
        )?;
        let rows = statement
            .query_map([], row_to_dedup_object)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Counts file-versions genuinely referencing `hash`, the
    /// authoritative source of truth GC reconciles `ref_count` against
    /// (§3, §4.I.1).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn count_references(&self, hash: &str) -> Result<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM file_versions WHERE dedup_ref = ?1",
            params![hash],
            |row| row.get(0),
        )
        .map_err(CatalogError::from)
    }

    /// Computes whole-catalog statistics for the agent's `get_stats`
    /// command (§4.J).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Database`] on SQLite failure.
    pub fn stats(&self) -> Result<Stats> {
        let total_versions: u64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM file_versions", [], |row| row.get(0))?;
        let total_paths: u64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT path) FROM file_versions",
            [],
            |row| row.get(0),
        )?;
        let total_dedup_objects: u64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM dedup_store", [], |row| row.get(0))?;
        let dedup_store_bytes: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(stored_size), 0) FROM dedup_store",
            [],
            |row| row.get(0),
        )?;
        let logical_bytes: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(plaintext_size), 0) FROM file_versions",
            [],
            |row| row.get(0),
        )?;

        Ok(Stats {
            total_versions,
            total_paths,
            total_dedup_objects,
            dedup_store_bytes: dedup_store_bytes as u64,
            logical_bytes: logical_bytes as u64,
        })
    }
}

fn row_to_file_version(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileVersion> {
    let action_str: String = row.get(4)?;
    let action = Action::parse(&action_str).unwrap_or(Action::Modified);
    let dedup_ref: Option<String> = row.get(5)?;
    let blob_path: Option<String> = row.get(6)?;
    let encrypted: bool = row.get(8)?;
    let nonce: Option<String> = row.get(9)?;

    let storage = match dedup_ref {
        Some(hash) => StorageDescriptor::DedupRef(hash),
        None => StorageDescriptor::BlobPath(blob_path.unwrap_or_default()),
    };
    let encryption = if encrypted {
        nonce.map(|nonce| EncryptionMetadata {
            nonce,
            algorithm: "AES-256-GCM".to_string(),
        })
    } else {
        None
    };

    Ok(FileVersion {
        path: row.get(0)?,
        timestamp: row.get(1)?,
        plaintext_size: row.get::<_, i64>(2)? as u64,
        plaintext_hash: row.get(3)?,
        action,
        storage,
        compressed: row.get(7)?,
        encrypted,
        encryption,
        stored_size: row
            .get::<_, Option<i64>>(10)?
            .map(|value| value as u64),
    })
}

fn row_to_dedup_object(row: &rusqlite::Row<'_>) -> rusqlite::Result<DedupObject> {
    let encrypted: bool = row.get(5)?;
    let nonce: Option<String> = row.get(6)?;
    let encryption = if encrypted {
        nonce.map(|nonce| EncryptionMetadata {
            nonce,
            algorithm: "AES-256-GCM".to_string(),
        })
    } else {
        None
    };

    Ok(DedupObject {
        hash: row.get(0)?,
        blob_path: row.get(1)?,
        original_size: row.get::<_, i64>(2)? as u64,
        stored_size: row.get::<_, i64>(3)? as u64,
        compressed: row.get(4)?,
        encrypted,
        encryption,
        ref_count: row.get(7)?,
    })
}
