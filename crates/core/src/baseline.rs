//! # Overview
//!
//! Resolves the cyclic dependency between the catalog, the version
//! pipeline, and the restore pipeline that delta-sync otherwise creates
//! (§9 "Cyclic module needs"): delta generation needs the latest saved
//! bytes of a path as its baseline, but "latest saved bytes" is exactly
//! what the pipeline and restore crates already know how to produce.
//!
//! Rather than a pipeline-depends-on-restore (or vice versa) edge, both
//! crates implement this single narrow trait and the delta-sync caller is
//! generic over it.

use std::path::PathBuf;

use crate::error::Result;

/// A source of "the latest saved plaintext for a logical path", used as
/// the baseline for delta generation (§4.C, §9).
pub trait BaselineProvider {
    /// Materializes the latest version of `path` into a temporary file
    /// and returns its location. The caller owns cleanup of the returned
    /// path once it is done reading it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::NotFound`] if `path` has no saved
    /// version, or [`crate::error::Error::BlobMissing`] if the catalog
    /// references a blob that is no longer on disk.
    fn materialize_latest(&self, path: &str) -> Result<PathBuf>;
}
