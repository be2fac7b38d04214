//! Pipeline-wide feature flags (§1, §4.F).

/// Which optional pipeline stages run on a save. All three default to
/// enabled, matching the version store's out-of-the-box posture.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PipelineOptions {
    /// Whether new blobs are gzip-compressed before encryption.
    pub compress: bool,
    /// Whether new blobs are AES-256-GCM encrypted. Requires a master
    /// key to be supplied to every pipeline call.
    pub encrypt: bool,
    /// Whether content-addressed deduplication is used. When disabled,
    /// every save writes a direct blob under `versions/<timestamp>/`.
    pub dedup: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            compress: true,
            encrypt: true,
            dedup: true,
        }
    }
}
