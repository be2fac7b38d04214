#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `restore` is component G of the version store: the inverse pipeline
//! (§4.G). Given `(path, timestamp, destination)` it reads the version
//! record, follows a dedup reference if present, decrypts, decompresses,
//! and writes the result to `destination`, verifying the restored bytes
//! hash to the value the catalog recorded.
//!
//! It implements [`core::BaselineProvider`] independently of `pipeline`
//! (§9): both read the same catalog and blob layout to materialize a
//! baseline, but neither crate depends on the other.

pub mod error;

use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use catalog::{Catalog, StorageDescriptor};
use core::baseline::BaselineProvider;
use cipher::MasterKey;
use hashcodec::gzip;
use hashcodec::hash::hash_bytes;

pub use error::{Result, RestoreError};

/// The read path of the version store: locate, decrypt, decompress,
/// write, verify (§4.G).
pub struct Restore<'a> {
    catalog: &'a Catalog,
    root: &'a Path,
    master_key: Option<&'a MasterKey>,
}

impl<'a> Restore<'a> {
    /// Builds a restore handle bound to one catalog, backup root, and
    /// (optionally) master key. `master_key` must be `Some` whenever the
    /// version being restored is encrypted.
    #[must_use]
    pub const fn new(catalog: &'a Catalog, root: &'a Path, master_key: Option<&'a MasterKey>) -> Self {
        Self {
            catalog,
            root,
            master_key,
        }
    }

    /// Restores `path`'s version as of `timestamp` to `destination`
    /// (§4.G). On hash mismatch, removes `destination` and returns
    /// [`RestoreError::CorruptionDetected`].
    ///
    /// # Errors
    ///
    /// Returns [`RestoreError::VersionNotFound`] if no such version
    /// exists, and propagates any catalog, store, or cipher failure.
    pub fn restore_version(
        &self,
        path: &str,
        timestamp: &str,
        destination: &Path,
    ) -> Result<()> {
        let version =
            self.catalog
                .get_version(path, timestamp)?
                .ok_or_else(|| RestoreError::VersionNotFound {
                    path: path.to_string(),
                    timestamp: timestamp.to_string(),
                })?;

        let (relative_blob, compressed, encrypted) = self.resolve_blob(
            &version.storage,
            version.compressed,
            version.encrypted,
        )?;
        let bytes = self.decode_blob(&relative_blob, compressed, encrypted)?;

        let actual_hash = hash_bytes(&bytes).to_hex();
        if actual_hash != version.plaintext_hash {
            let _ = fs::remove_file(destination);
            return Err(RestoreError::CorruptionDetected {
                expected: version.plaintext_hash,
                actual: actual_hash,
            });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(destination)?;
        file.write_all(&bytes)?;
        file.sync_all()?;

        tracing::info!(path, timestamp, "restored version");
        Ok(())
    }

    /// Restores the latest version of `path` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreError::VersionNotFound`] if `path` has no
    /// versions, and propagates any catalog, store, or cipher failure.
    pub fn restore_latest(&self, path: &str, destination: &Path) -> Result<()> {
        let version =
            self.catalog
                .latest_version(path)?
                .ok_or_else(|| RestoreError::VersionNotFound {
                    path: path.to_string(),
                    timestamp: "latest".to_string(),
                })?;
        self.restore_version(path, &version.timestamp, destination)
    }

    fn resolve_blob(
        &self,
        storage: &StorageDescriptor,
        version_compressed: bool,
        version_encrypted: bool,
    ) -> Result<(PathBuf, bool, bool)> {
        match storage {
            StorageDescriptor::DedupRef(hash) => {
                let object =
                    self.catalog
                        .get_dedup(hash)?
                        .ok_or_else(|| RestoreError::Store(store::StoreError::BlobMissing {
                            path: PathBuf::from(hash),
                        }))?;
                Ok((
                    PathBuf::from(object.blob_path),
                    object.compressed,
                    object.encrypted,
                ))
            }
            StorageDescriptor::BlobPath(path) => {
                Ok((PathBuf::from(path), version_compressed, version_encrypted))
            }
        }
    }

    /// Applies the inverse pipeline to the blob at `relative_blob`:
    /// decrypt (if encrypted) then decompress (if compressed) (§4.G
    /// step 2).
    fn decode_blob(&self, relative_blob: &Path, compressed: bool, encrypted: bool) -> Result<Vec<u8>> {
        let mut bytes = store::blob::read_blob(self.root, relative_blob)?;

        if encrypted {
            let key = self.master_key.ok_or(RestoreError::Cipher(
                cipher::CipherError::PasswordMismatch,
            ))?;
            let mut decrypted = Vec::new();
            cipher::stream::decrypt(Cursor::new(&bytes), &mut decrypted, key)?;
            bytes = decrypted;
        }
        if compressed {
            let mut decompressed = Vec::new();
            gzip::decompress(Cursor::new(&bytes), &mut decompressed)?;
            bytes = decompressed;
        }

        Ok(bytes)
    }
}

impl<'a> BaselineProvider for Restore<'a> {
    /// Materializes the latest version of `path` into a temporary
    /// plaintext file, for use as a delta baseline (§9). Implemented
    /// independently of the `pipeline` crate so that neither crate
    /// depends on the other for this shared need.
    fn materialize_latest(&self, path: &str) -> core::Result<PathBuf> {
        let version = self
            .catalog
            .latest_version(path)
            .map_err(RestoreError::from)?
            .ok_or_else(|| core::Error::NotFound {
                what: format!("version of {path}"),
            })?;

        let (relative_blob, compressed, encrypted) = self
            .resolve_blob(&version.storage, version.compressed, version.encrypted)
            .map_err(core::Error::from)?;
        let bytes = self
            .decode_blob(&relative_blob, compressed, encrypted)
            .map_err(core::Error::from)?;

        let mut temp = tempfile::NamedTempFile::new()?;
        temp.write_all(&bytes)?;
        let path = temp
            .into_temp_path()
            .keep()
            .map_err(|err| core::Error::Io(err.error))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Catalog;
    use cipher::MasterKey;
    use core::timestamp::TimestampSource;
    use pipeline::{Pipeline, PipelineOptions};
    use test_support::TempBackupRoot;

    #[test]
    fn restores_latest_version_byte_for_byte() {
        let catalog = Catalog::open_in_memory().unwrap();
        let root = TempBackupRoot::new();
        let timestamps = TimestampSource::new();
        let key = MasterKey::generate();
        let pipeline = Pipeline::new(
            &catalog,
            root.path(),
            &timestamps,
            Some(&key),
            PipelineOptions::default(),
        );
        let source = root.write_source_file("a.txt", b"hello, restore\n");
        pipeline.save_version("docs/a.txt", &source).unwrap();

        let restore = Restore::new(&catalog, root.path(), Some(&key));
        let destination = root.path().join("restored.txt");
        restore.restore_latest("docs/a.txt", &destination).unwrap();

        assert_eq!(fs::read(&destination).unwrap(), b"hello, restore\n");
    }

    #[test]
    fn restore_of_unknown_path_is_version_not_found() {
        let catalog = Catalog::open_in_memory().unwrap();
        let root = TempBackupRoot::new();
        let key = MasterKey::generate();
        let restore = Restore::new(&catalog, root.path(), Some(&key));

        let destination = root.path().join("restored.txt");
        let result = restore.restore_latest("missing.txt", &destination);
        assert!(matches!(result, Err(RestoreError::VersionNotFound { .. })));
    }

    #[test]
    fn restore_with_wrong_key_fails_authentication() {
        let catalog = Catalog::open_in_memory().unwrap();
        let root = TempBackupRoot::new();
        let timestamps = TimestampSource::new();
        let key = MasterKey::generate();
        let pipeline = Pipeline::new(
            &catalog,
            root.path(),
            &timestamps,
            Some(&key),
            PipelineOptions::default(),
        );
        let source = root.write_source_file("a.txt", b"secret contents");
        pipeline.save_version("docs/a.txt", &source).unwrap();

        let wrong_key = MasterKey::generate();
        let restore = Restore::new(&catalog, root.path(), Some(&wrong_key));
        let destination = root.path().join("restored.txt");
        let result = restore.restore_latest("docs/a.txt", &destination);
        assert!(matches!(result, Err(RestoreError::Cipher(_))));
    }

    #[test]
    fn materialize_latest_implements_baseline_provider() {
        let catalog = Catalog::open_in_memory().unwrap();
        let root = TempBackupRoot::new();
        let timestamps = TimestampSource::new();
        let key = MasterKey::generate();
        let pipeline = Pipeline::new(
            &catalog,
            root.path(),
            &timestamps,
            Some(&key),
            PipelineOptions::default(),
        );
        let source = root.write_source_file("a.txt", b"baseline content");
        pipeline.save_version("docs/a.txt", &source).unwrap();

        let restore = Restore::new(&catalog, root.path(), Some(&key));
        let baseline_path = restore.materialize_latest("docs/a.txt").unwrap();
        assert_eq!(fs::read(&baseline_path).unwrap(), b"baseline content");
        let _ = fs::remove_file(baseline_path);
    }
}
