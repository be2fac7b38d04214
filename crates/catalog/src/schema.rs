//! # Overview
//!
//! Catalog schema creation and additive migration (§4.D): the two
//! tables of §3 plus their indexes, created fresh on a new backup root
//! and extended in place on an older one via `ALTER TABLE ... ADD
//! COLUMN`, tolerating the "duplicate column" error that SQLite raises
//! when the column is already there.

use rusqlite::Connection;

use crate::error::Result;

/// Creates the base schema if absent, then applies every additive
/// migration. Safe to call on every open, including one that already
/// has the current schema.
pub(crate) fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS file_versions (
            path            TEXT NOT NULL,
            timestamp       TEXT NOT NULL,
            plaintext_size  INTEGER NOT NULL,
            plaintext_hash  TEXT NOT NULL,
            action          TEXT NOT NULL,
            dedup_ref       TEXT,
            blob_path       TEXT,
            compressed      INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (path, timestamp)
        );

        CREATE TABLE IF NOT EXISTS dedup_store (
            hash            TEXT PRIMARY KEY,
            blob_path       TEXT NOT NULL,
            original_size   INTEGER NOT NULL,
            stored_size     INTEGER NOT NULL,
            compressed      INTEGER NOT NULL DEFAULT 0,
            ref_count       INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_file_versions_path ON file_versions(path);
        CREATE INDEX IF NOT EXISTS idx_file_versions_timestamp ON file_versions(timestamp);
        CREATE INDEX IF NOT EXISTS idx_file_versions_hash ON file_versions(plaintext_hash);
        ",
    )?;

    // Columns added after the initial release (§4.D): encryption support
    // on both tables, plus the per-version stored size. Older roots get
    // these added in place; `duplicate column name` on an already
    // migrated root is expected and ignored.
    for statement in [
        "ALTER TABLE file_versions ADD COLUMN encrypted INTEGER NOT NULL DEFAULT 0",
        "ALTER TABLE file_versions ADD COLUMN encryption_nonce TEXT",
        "ALTER TABLE file_versions ADD COLUMN stored_size INTEGER",
        "ALTER TABLE dedup_store ADD COLUMN encrypted INTEGER NOT NULL DEFAULT 0",
        "ALTER TABLE dedup_store ADD COLUMN encryption_nonce TEXT",
    ] {
        match conn.execute(statement, []) {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(_, Some(message)))
                if message.contains("duplicate column name") => {}
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
