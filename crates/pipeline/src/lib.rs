#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `pipeline` is component F of the version store: the write path that
//! turns a candidate source file into an indexed, deduplicated,
//! compressed, and encrypted version (§4.F). It composes [`hashcodec`],
//! [`cipher`], [`store`], and [`catalog`] but knows about none of their
//! internals beyond the public API each exposes.
//!
//! # See also
//!
//! - [`options::PipelineOptions`] for the compress/encrypt/dedup flags.
//! - [`restore`] (sibling crate) for the inverse pipeline.

pub mod options;

use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use catalog::{Action, Catalog, DedupObject, EncryptionMetadata, FileVersion, StorageDescriptor};
use cipher::MasterKey;
use core::baseline::BaselineProvider;
use core::error::{Error, Result};
use core::timestamp::TimestampSource;
use delta::DeltaScript;
use hashcodec::gzip::{self, CompressionLevel};
use hashcodec::hash::{hash_bytes, hash_stream};

pub use options::PipelineOptions;

/// The outcome of a save attempt (§4.F).
#[derive(Debug)]
pub enum SaveOutcome {
    /// The incoming content hashed identically to the existing
    /// `current/` shadow; nothing was written (§4.F step 2).
    NoOp,
    /// A new version was recorded.
    Saved(FileVersion),
}

/// The write path of the version store: hash, dedup lookup, compress,
/// encrypt, persist, index (§4.F).
pub struct Pipeline<'a> {
    catalog: &'a Catalog,
    root: &'a Path,
    timestamps: &'a TimestampSource,
    master_key: Option<&'a MasterKey>,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    /// Builds a pipeline bound to one catalog, backup root, timestamp
    /// source, and (optionally) master key. `master_key` must be `Some`
    /// whenever `options.encrypt` is `true`.
    #[must_use]
    pub fn new(
        catalog: &'a Catalog,
        root: &'a Path,
        timestamps: &'a TimestampSource,
        master_key: Option<&'a MasterKey>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            catalog,
            root,
            timestamps,
            master_key,
            options,
        }
    }

    /// Saves `source`'s contents as the next version of `relative_path`
    /// (§4.F steps 1-7). A no-op if the content is unchanged from the
    /// current shadow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProtocolError`] if encryption is enabled without
    /// a master key, and propagates any I/O, catalog, or cipher failure.
    pub fn save_version(&self, relative_path: &str, source: &Path) -> Result<SaveOutcome> {
        let mut source_file = File::open(source)?;
        let (new_hash, new_size) = hash_stream(&mut source_file)?;

        if let Some(current_hash) = store::shadow::read_current_hash(self.root, relative_path)? {
            if current_hash == new_hash {
                return Ok(SaveOutcome::NoOp);
            }
        }

        let plaintext = fs::read(source)?;
        let version = self.archive_new_version(
            relative_path,
            &plaintext,
            new_hash.to_hex(),
            new_size,
            None,
        )?;
        store::shadow::write_current(self.root, relative_path, &plaintext)?;

        tracing::info!(path = relative_path, timestamp = %version.timestamp, "saved version");
        Ok(SaveOutcome::Saved(version))
    }

    /// Reconstructs `relative_path`'s new content from `script` against
    /// its current baseline, then saves it exactly as
    /// [`Self::save_version`] would (§4.F "Delta-based save"). The
    /// delta is purely a bandwidth optimization; the result is
    /// indistinguishable on disk from a full upload of the same bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `relative_path` has no prior
    /// version to use as a baseline, [`Error::ProtocolError`] if the
    /// script references a block absent from that baseline, and
    /// propagates any other I/O, catalog, or cipher failure.
    pub fn save_delta(&self, relative_path: &str, script: &DeltaScript) -> Result<SaveOutcome> {
        let baseline_path = self.materialize_latest(relative_path)?;
        let baseline_file = File::open(&baseline_path)?;
        let mut reconstructed = tempfile::NamedTempFile::new()?;
        let apply_result =
            delta::apply_delta(baseline_file, script, reconstructed.as_file_mut());
        let _ = fs::remove_file(&baseline_path);
        apply_result.map_err(delta_error_to_core)?;

        let reconstructed_path = reconstructed
            .into_temp_path()
            .keep()
            .map_err(|err| Error::Io(err.error))?;
        let outcome = self.save_version(relative_path, &reconstructed_path);
        let _ = fs::remove_file(&reconstructed_path);
        outcome
    }

    /// Archives a final pre-deletion version of `relative_path` and
    /// removes its shadow (§4.F "Delete"). A no-op success if the path
    /// has no current shadow.
    ///
    /// # Errors
    ///
    /// Propagates any I/O, catalog, or cipher failure.
    pub fn delete_version(&self, relative_path: &str) -> Result<Option<FileVersion>> {
        if !store::shadow::current_exists(self.root, relative_path) {
            return Ok(None);
        }

        let absolute = self.root.join(store::layout::current_path(relative_path));
        let plaintext = fs::read(&absolute)?;
        let hash = hash_bytes(&plaintext);

        let version = self.archive_new_version(
            relative_path,
            &plaintext,
            hash.to_hex(),
            plaintext.len() as u64,
            Some(Action::Deleted),
        )?;
        store::shadow::delete_current(self.root, relative_path)?;

        tracing::info!(path = relative_path, timestamp = %version.timestamp, "deleted path, archived final version");
        Ok(Some(version))
    }

    /// Runs steps 3-6 of §4.F: allocate a timestamp, run the
    /// dedup-aware storage pipeline, and insert the catalog record.
    /// Shared by [`Self::save_version`] and [`Self::delete_version`],
    /// which differ only in the resulting [`Action`] and in what happens
    /// to the shadow afterward.
    fn archive_new_version(
        &self,
        relative_path: &str,
        plaintext: &[u8],
        plaintext_hash: String,
        plaintext_size: u64,
        forced_action: Option<Action>,
    ) -> Result<FileVersion> {
        let timestamp = self.timestamps.next();
        let action = match forced_action {
            Some(action) => action,
            None => match self.catalog.latest_version(relative_path)? {
                Some(_) => Action::Modified,
                None => Action::Created,
            },
        };

        let (storage, compressed, encrypted, encryption, stored_size) = if self.options.dedup {
            self.store_deduplicated(&plaintext_hash, plaintext_size, plaintext)?
        } else {
            self.store_direct(&timestamp, relative_path, plaintext)?
        };

        let version = FileVersion {
            path: relative_path.to_string(),
            timestamp,
            plaintext_size,
            plaintext_hash,
            action,
            storage,
            compressed,
            encrypted,
            encryption,
            stored_size,
        };
        self.catalog.insert_file_version(&version)?;
        Ok(version)
    }

    /// Dedup-aware storage (§4.F step 4): reuse an existing blob on a
    /// hash hit, or run compress/encrypt/persist and register a new
    /// dedup object on a miss.
    fn store_deduplicated(
        &self,
        hash_hex: &str,
        plaintext_size: u64,
        plaintext: &[u8],
    ) -> Result<(StorageDescriptor, bool, bool, Option<EncryptionMetadata>, Option<u64>)> {
        if let Some(existing) = self.catalog.get_dedup(hash_hex)? {
            self.catalog.increment_ref_count(hash_hex)?;
            return Ok((
                StorageDescriptor::DedupRef(hash_hex.to_string()),
                existing.compressed,
                existing.encrypted,
                existing.encryption,
                None,
            ));
        }

        let (encoded, compressed, encrypted, encryption) = self.encode_blob(plaintext)?;
        let relative_blob = store::layout::dedup_blob_path(hash_hex, compressed, encrypted);
        let stored_size = store::blob::write_blob(self.root, &relative_blob, &encoded)?;

        self.catalog.insert_dedup(&DedupObject {
            hash: hash_hex.to_string(),
            blob_path: relative_blob.display().to_string(),
            original_size: plaintext_size,
            stored_size,
            compressed,
            encrypted,
            encryption: encryption.clone(),
            ref_count: 1,
        })?;

        Ok((
            StorageDescriptor::DedupRef(hash_hex.to_string()),
            compressed,
            encrypted,
            encryption,
            Some(stored_size),
        ))
    }

    /// Non-dedup storage (§4.F step 5): always writes a fresh blob under
    /// `versions/<timestamp>/...`.
    fn store_direct(
        &self,
        timestamp: &str,
        relative_path: &str,
        plaintext: &[u8],
    ) -> Result<(StorageDescriptor, bool, bool, Option<EncryptionMetadata>, Option<u64>)> {
        let (encoded, compressed, encrypted, encryption) = self.encode_blob(plaintext)?;
        let relative_blob =
            store::layout::version_blob_path(timestamp, relative_path, compressed, encrypted);
        let stored_size = store::blob::write_blob(self.root, &relative_blob, &encoded)?;

        Ok((
            StorageDescriptor::BlobPath(relative_blob.display().to_string()),
            compressed,
            encrypted,
            encryption,
            Some(stored_size),
        ))
    }

    /// Runs the compress-then-encrypt stages over `plaintext` (§4.A,
    /// §4.B, §4.F), returning the final bytes plus the flags and
    /// encryption metadata to record alongside them.
    fn encode_blob(
        &self,
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, bool, bool, Option<EncryptionMetadata>)> {
        let (staged, compressed) = if self.options.compress {
            let mut buffer = Vec::new();
            let outcome =
                gzip::compress(Cursor::new(plaintext), &mut buffer, CompressionLevel::Default)?;
            (buffer, outcome.compressed)
        } else {
            (plaintext.to_vec(), false)
        };

        if !self.options.encrypt {
            return Ok((staged, compressed, false, None));
        }

        let key = self.master_key.ok_or_else(|| Error::ProtocolError {
            reason: "encryption enabled but no master key supplied".to_string(),
        })?;
        let mut ciphertext = Vec::new();
        cipher::stream::encrypt(Cursor::new(&staged), &mut ciphertext, key)?;
        let nonce = &ciphertext[..cipher::stream::NONCE_LEN];
        let encryption = EncryptionMetadata {
            nonce: BASE64.encode(nonce),
            algorithm: "AES-256-GCM".to_string(),
        };

        Ok((ciphertext, compressed, true, Some(encryption)))
    }

    /// Resolves a version's storage descriptor to the blob path and
    /// pipeline flags actually governing its bytes, following
    /// `dedup_ref` into the dedup table when needed.
    fn resolve_blob(&self, version: &FileVersion) -> Result<(PathBuf, bool, bool)> {
        match &version.storage {
            StorageDescriptor::DedupRef(hash) => {
                let object = self
                    .catalog
                    .get_dedup(hash)?
                    .ok_or_else(|| Error::BlobMissing {
                        hash: hash.clone(),
                        path: PathBuf::from(hash),
                    })?;
                Ok((
                    PathBuf::from(object.blob_path),
                    object.compressed,
                    object.encrypted,
                ))
            }
            StorageDescriptor::BlobPath(path) => {
                Ok((PathBuf::from(path), version.compressed, version.encrypted))
            }
        }
    }
}

impl<'a> BaselineProvider for Pipeline<'a> {
    /// Materializes the latest version of `path` into a temporary
    /// plaintext file, for use as a delta baseline (§9). Implemented
    /// independently of the `restore` crate so that neither crate
    /// depends on the other for this shared need.
    fn materialize_latest(&self, path: &str) -> Result<PathBuf> {
        let version = self
            .catalog
            .latest_version(path)?
            .ok_or_else(|| Error::NotFound {
                what: format!("version of {path}"),
            })?;
        let (relative_blob, compressed, encrypted) = self.resolve_blob(&version)?;
        let mut bytes = store::blob::read_blob(self.root, &relative_blob)?;

        if encrypted {
            let key = self.master_key.ok_or_else(|| Error::ProtocolError {
                reason: "stored version is encrypted but no master key supplied".to_string(),
            })?;
            let mut decrypted = Vec::new();
            cipher::stream::decrypt(Cursor::new(&bytes), &mut decrypted, key)?;
            bytes = decrypted;
        }
        if compressed {
            let mut decompressed = Vec::new();
            gzip::decompress(Cursor::new(&bytes), &mut decompressed)?;
            bytes = decompressed;
        }

        let mut temp = tempfile::NamedTempFile::new()?;
        temp.write_all(&bytes)?;
        let path = temp
            .into_temp_path()
            .keep()
            .map_err(|err| Error::Io(err.error))?;
        Ok(path)
    }
}

fn delta_error_to_core(err: delta::DeltaError) -> Error {
    match err {
        delta::DeltaError::UnknownBlock(index) => Error::ProtocolError {
            reason: format!("delta references unknown baseline block {index}"),
        },
        delta::DeltaError::Io(io_err) => Error::Io(io_err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::TempBackupRoot;

    fn pipeline_with<'a>(
        catalog: &'a Catalog,
        root: &'a TempBackupRoot,
        timestamps: &'a TimestampSource,
        key: &'a MasterKey,
    ) -> Pipeline<'a> {
        Pipeline::new(catalog, root.path(), timestamps, Some(key), PipelineOptions::default())
    }

    #[test]
    fn first_save_is_created_and_second_identical_save_is_noop() {
        let catalog = Catalog::open_in_memory().unwrap();
        let root = TempBackupRoot::new();
        let timestamps = TimestampSource::new();
        let key = MasterKey::generate();
        let pipeline = pipeline_with(&catalog, &root, &timestamps, &key);

        let source = root.write_source_file("a.txt", b"hello\n");
        let outcome = pipeline.save_version("docs/a.txt", &source).unwrap();
        let version = match outcome {
            SaveOutcome::Saved(v) => v,
            SaveOutcome::NoOp => panic!("expected a save"),
        };
        assert_eq!(version.action, Action::Created);

        let outcome = pipeline.save_version("docs/a.txt", &source).unwrap();
        assert!(matches!(outcome, SaveOutcome::NoOp));
    }

    #[test]
    fn second_distinct_save_is_modified() {
        let catalog = Catalog::open_in_memory().unwrap();
        let root = TempBackupRoot::new();
        let timestamps = TimestampSource::new();
        let key = MasterKey::generate();
        let pipeline = pipeline_with(&catalog, &root, &timestamps, &key);

        let first = root.write_source_file("a.txt", b"v1");
        pipeline.save_version("docs/a.txt", &first).unwrap();

        let second = root.write_source_file("a2.txt", b"v2");
        let outcome = pipeline.save_version("docs/a.txt", &second).unwrap();
        match outcome {
            SaveOutcome::Saved(version) => assert_eq!(version.action, Action::Modified),
            SaveOutcome::NoOp => panic!("expected a save"),
        }
    }

    #[test]
    fn identical_content_across_paths_deduplicates_to_one_blob() {
        let catalog = Catalog::open_in_memory().unwrap();
        let root = TempBackupRoot::new();
        let timestamps = TimestampSource::new();
        let key = MasterKey::generate();
        let pipeline = pipeline_with(&catalog, &root, &timestamps, &key);

        let payload = vec![0u8; 1024 * 1024];
        let first = root.write_source_file("1.bin", &payload);
        let second = root.write_source_file("2.bin", &payload);

        pipeline.save_version("x/1.bin", &first).unwrap();
        pipeline.save_version("x/2.bin", &second).unwrap();

        let hash = hash_bytes(&payload).to_hex();
        let object = catalog.get_dedup(&hash).unwrap().unwrap();
        assert_eq!(object.ref_count, 2);
    }

    #[test]
    fn delete_archives_final_version_and_removes_shadow() {
        let catalog = Catalog::open_in_memory().unwrap();
        let root = TempBackupRoot::new();
        let timestamps = TimestampSource::new();
        let key = MasterKey::generate();
        let pipeline = pipeline_with(&catalog, &root, &timestamps, &key);

        let source = root.write_source_file("a.txt", b"v1");
        pipeline.save_version("docs/a.txt", &source).unwrap();

        let deleted = pipeline.delete_version("docs/a.txt").unwrap().unwrap();
        assert_eq!(deleted.action, Action::Deleted);
        assert!(!store::shadow::current_exists(root.path(), "docs/a.txt"));

        let versions = catalog.list_versions("docs/a.txt").unwrap();
        assert_eq!(versions.len(), 2);
    }

    #[test]
    fn delete_of_unknown_path_is_noop() {
        let catalog = Catalog::open_in_memory().unwrap();
        let root = TempBackupRoot::new();
        let timestamps = TimestampSource::new();
        let key = MasterKey::generate();
        let pipeline = pipeline_with(&catalog, &root, &timestamps, &key);

        assert!(pipeline.delete_version("missing.txt").unwrap().is_none());
    }

    #[test]
    fn disabling_encryption_persists_plaintext_blob_bytes() {
        let catalog = Catalog::open_in_memory().unwrap();
        let root = TempBackupRoot::new();
        let timestamps = TimestampSource::new();
        let options = PipelineOptions {
            compress: false,
            encrypt: false,
            dedup: true,
        };
        let pipeline = Pipeline::new(&catalog, root.path(), &timestamps, None, options);

        let source = root.write_source_file("a.txt", b"plaintext bytes");
        let outcome = pipeline.save_version("docs/a.txt", &source).unwrap();
        let version = match outcome {
            SaveOutcome::Saved(v) => v,
            SaveOutcome::NoOp => panic!("expected a save"),
        };
        assert!(!version.encrypted);

        let hash = hash_bytes(b"plaintext bytes").to_hex();
        let relative = store::layout::dedup_blob_path(&hash, false, false);
        let bytes = store::blob::read_blob(root.path(), &relative).unwrap();
        assert_eq!(bytes, b"plaintext bytes");
    }
}
