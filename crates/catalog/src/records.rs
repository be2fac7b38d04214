//! # Overview
//!
//! The two record types the catalog persists (§3): an immutable
//! [`FileVersion`] per save, and one [`DedupObject`] per unique
//! plaintext hash.

/// Why a version was recorded (§3).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    /// The first version ever recorded for this path.
    Created,
    /// A later version of an already-known path.
    Modified,
    /// A final, pre-deletion snapshot recorded when the path is deleted.
    Deleted,
}

impl Action {
    /// Renders the stable string stored in the `action` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        }
    }

    /// Parses the `action` column back into an [`Action`].
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(Self::Created),
            "modified" => Some(Self::Modified),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Encryption metadata recorded alongside an encrypted blob (§3): just
/// enough to decrypt it again, never the key itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptionMetadata {
    /// Base64-encoded AES-GCM nonce used for this blob.
    pub nonce: String,
    /// Algorithm identifier, currently always `AES-256-GCM`.
    pub algorithm: String,
}

/// Where a version's bytes physically live (§3): either a dedup
/// reference into `dedup_store/`, or a direct path under `versions/`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StorageDescriptor {
    /// Points at the dedup object keyed by this plaintext hash.
    DedupRef(String),
    /// A direct, non-deduplicated blob path relative to the backup root.
    BlobPath(String),
}

/// An immutable file-version record (§3): created once by the pipeline,
/// never mutated, destroyed only by retention followed by GC.
#[derive(Clone, Debug)]
pub struct FileVersion {
    /// Logical file key.
    pub path: String,
    /// `YYYY-MM-DD_HH-MM-SS-ffffff`, unique per path.
    pub timestamp: String,
    /// Size of the plaintext in bytes.
    pub plaintext_size: u64,
    /// SHA-256 hex digest of the plaintext.
    pub plaintext_hash: String,
    /// Why this version exists.
    pub action: Action,
    /// Where the version's bytes are stored.
    pub storage: StorageDescriptor,
    /// Whether the stored bytes went through gzip compression.
    pub compressed: bool,
    /// Whether the stored bytes went through AES-256-GCM encryption.
    pub encrypted: bool,
    /// Present iff `encrypted`.
    pub encryption: Option<EncryptionMetadata>,
    /// Size on disk after compression/encryption, when this version owns
    /// its own blob (`None` for a dedup hit that reused an existing
    /// blob without writing a new one).
    pub stored_size: Option<u64>,
}

impl FileVersion {
    /// The dedup hash this version points at, if deduplicated.
    #[must_use]
    pub fn dedup_ref(&self) -> Option<&str> {
        match &self.storage {
            StorageDescriptor::DedupRef(hash) => Some(hash),
            StorageDescriptor::BlobPath(_) => None,
        }
    }
}

/// One dedup object per unique `plaintext_hash` (§3).
#[derive(Clone, Debug)]
pub struct DedupObject {
    /// SHA-256 hex digest of the plaintext this object stores.
    pub hash: String,
    /// Canonical blob path relative to the backup root.
    pub blob_path: String,
    /// Original (plaintext) size in bytes.
    pub original_size: u64,
    /// Size on disk after compression/encryption.
    pub stored_size: u64,
    /// Whether the blob is gzip-compressed.
    pub compressed: bool,
    /// Whether the blob is AES-256-GCM encrypted.
    pub encrypted: bool,
    /// Present iff `encrypted`.
    pub encryption: Option<EncryptionMetadata>,
    /// Number of file-versions currently referencing this object.
    pub ref_count: i64,
}
