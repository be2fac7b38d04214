#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `gc` is component I of the version store: the garbage collector that
//! reconciles the catalog's recorded dedup ref-counts against reality
//! and reclaims objects nothing references any more (§4.I).
//!
//! Ref-counts drift only in the direction of being too high (a crash
//! between a retention decrement and its commit, for instance), never
//! too low, so the collector treats `ref_count <= 0` as merely a
//! *candidate* for deletion: it recomputes the true count from
//! `file_versions` before trusting it. A candidate whose true count
//! turns out positive is repaired in place and left alone; only a
//! candidate with zero true references is actually removed.

pub mod error;

use std::path::Path;

use catalog::Catalog;

pub use error::{GcError, Result};

/// Summary of one collection pass (§4.I, §4.J `gc` command).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CollectionReport {
    /// Dedup objects whose blob and record were removed.
    pub objects_removed: u64,
    /// Dedup objects whose `ref_count` was found to have drifted and
    /// was repaired in place, without being removed.
    pub objects_repaired: u64,
    /// Total bytes reclaimed by removed blobs.
    pub bytes_reclaimed: u64,
}

/// Runs one garbage collection pass against `backup_root` (§4.I).
///
/// For every dedup object with a recorded `ref_count <= 0`: recomputes
/// the true reference count from `file_versions`. If positive, repairs
/// the stored count and moves on without touching the blob or record —
/// the drift means retention's decrement outran an earlier version's
/// insert, not that the object is truly unreferenced. Only when the
/// true count is zero does the object's blob get deleted, followed by
/// its catalog record.
///
/// # Errors
///
/// Returns [`GcError`] if the catalog or store operations fail. A
/// failure partway through a pass leaves already-processed objects in
/// their new state; callers that need atomicity across the whole pass
/// should hold the catalog lock for its duration.
pub fn collect(catalog: &Catalog, backup_root: &Path) -> Result<CollectionReport> {
    let mut report = CollectionReport::default();

    for object in catalog.dedup_objects_with_nonpositive_ref_count()? {
        let true_refs = catalog.count_references(&object.hash)?;

        if true_refs > 0 {
            tracing::warn!(
                hash = %object.hash,
                recorded = object.ref_count,
                actual = true_refs,
                "repairing drifted dedup ref-count",
            );
            catalog.set_ref_count(&object.hash, true_refs)?;
            report.objects_repaired += 1;
            continue;
        }

        let blob_path = Path::new(&object.blob_path);
        if store::blob::blob_exists(backup_root, blob_path) {
            let size = store::blob::blob_size(backup_root, blob_path)?;
            store::blob::delete_blob(backup_root, blob_path)?;
            report.bytes_reclaimed += size;
        }
        catalog.delete_dedup(&object.hash)?;
        report.objects_removed += 1;
    }

    Ok(report)
}
