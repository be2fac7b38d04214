#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `retention` is component H of the version store: Grandfather-Father-Son
//! selection of which versions of a path survive as they age, and the
//! catalog mutation that retires the rest (§4.H).
//!
//! Selection is pure: [`versions_to_retire`] takes a list of timestamps and
//! a current instant and returns the subset to delete, with no I/O.
//! [`prune_path`] and [`prune_all`] perform the actual catalog mutation,
//! mirroring the pipeline's rule that dedup blobs are only ever reclaimed
//! by the garbage collector (§4.H, §4.I): retiring a deduplicated version
//! decrements its dedup object's `ref_count`; retiring a direct version
//! deletes its blob outright.

pub mod error;

use std::collections::HashMap;
use std::path::Path;

use catalog::{Catalog, StorageDescriptor};
use core::{civil_from_days, days_from_civil, parse_timestamp};

pub use error::{Result, RetentionError};

const HOUR_MICROS: i64 = 3_600 * 1_000_000;
const DAY_MICROS: i64 = 24 * HOUR_MICROS;
const WEEK_MICROS: i64 = 7 * DAY_MICROS;
const MONTH_AGE_MICROS: i64 = 28 * DAY_MICROS;
const YEAR_MICROS: i64 = 365 * DAY_MICROS;

/// A single report line: how many versions of one path were retired.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PruneReport {
    /// The logical path that was pruned.
    pub path: String,
    /// Timestamps of the versions that were retired.
    pub retired: Vec<String>,
}

/// Given every timestamp a path has, newest first, and the current instant
/// in microseconds since the epoch, returns the subset to retire under the
/// Grandfather-Father-Son policy (§4.H).
///
/// `timestamps` need not be sorted; this function sorts its own copy.
/// Timestamps that fail to parse are never retired — an unparseable
/// timestamp can't be aged, so it is left alone rather than guessed at.
#[must_use]
pub fn versions_to_retire(timestamps: &[String], now_micros: i64) -> Vec<String> {
    let mut parsed: Vec<(i64, &String)> = timestamps
        .iter()
        .filter_map(|ts| parse_timestamp(ts).map(|micros| (micros, ts)))
        .collect();
    parsed.sort_by(|a, b| b.0.cmp(&a.0));

    let mut keep = std::collections::HashSet::new();
    let mut seen_days = HashMap::new();
    let mut seen_weeks = HashMap::new();
    let mut seen_months = HashMap::new();

    for &(micros, ts) in &parsed {
        let age = now_micros - micros;
        if age < DAY_MICROS {
            keep.insert(ts.as_str());
            continue;
        }

        let (year, month, day) = civil_date(micros);
        if age < WEEK_MICROS {
            let bucket = (year, month, day);
            if seen_days.insert(bucket, ()).is_none() {
                keep.insert(ts.as_str());
            }
        } else if age < MONTH_AGE_MICROS {
            let bucket = iso_week(micros);
            if seen_weeks.insert(bucket, ()).is_none() {
                keep.insert(ts.as_str());
            }
        } else if age < YEAR_MICROS {
            let bucket = (year, month);
            if seen_months.insert(bucket, ()).is_none() {
                keep.insert(ts.as_str());
            }
        }
        // age >= YEAR_MICROS: never kept.
    }

    timestamps
        .iter()
        .filter(|ts| !keep.contains(ts.as_str()))
        .cloned()
        .collect()
}

/// Retires the versions of one path that fall outside the Grandfather-
/// Father-Son keep-set as of `now_micros`, mutating the catalog. A
/// retired dedup-backed version only decrements its dedup object's
/// `ref_count` — the blob itself is reclaimed later by the garbage
/// collector (§4.H, §4.I). A retired direct (non-deduplicated) version
/// owns its blob outright, so its file is removed here (§4.H "removing
/// the direct blob").
///
/// # Errors
///
/// Returns [`RetentionError`] on catalog or store failure. A failure
/// partway through leaves already-retired versions retired; callers that
/// need all-or-nothing semantics should hold the catalog lock for the
/// whole call.
pub fn prune_path(
    catalog: &Catalog,
    backup_root: &Path,
    path: &str,
    now_micros: i64,
) -> Result<PruneReport> {
    let versions = catalog.list_versions(path)?;
    let timestamps: Vec<String> = versions.iter().map(|v| v.timestamp.clone()).collect();
    let retire = versions_to_retire(&timestamps, now_micros);

    for timestamp in &retire {
        let Some(version) = versions.iter().find(|v| &v.timestamp == timestamp) else {
            continue;
        };
        match &version.storage {
            StorageDescriptor::DedupRef(hash) => catalog.decrement_ref_count(hash)?,
            StorageDescriptor::BlobPath(blob_path) => {
                store::blob::delete_blob(backup_root, Path::new(blob_path))?;
            }
        }
        catalog.delete_version(path, timestamp)?;
    }

    if !retire.is_empty() {
        tracing::info!(path, retired = retire.len(), "retired versions outside the GFS keep-set");
    }

    Ok(PruneReport {
        path: path.to_string(),
        retired: retire,
    })
}

/// Runs [`prune_path`] over every logical path the catalog knows about.
///
/// # Errors
///
/// Returns [`RetentionError`] on catalog or store failure.
pub fn prune_all(catalog: &Catalog, backup_root: &Path, now_micros: i64) -> Result<Vec<PruneReport>> {
    let paths = catalog.list_paths()?;
    paths
        .into_iter()
        .map(|path| prune_path(catalog, backup_root, &path, now_micros))
        .collect()
}

fn civil_date(micros: i64) -> (i64, u32, u32) {
    let days_since_epoch = micros.div_euclid(86_400 * 1_000_000);
    civil_from_days(days_since_epoch)
}

/// ISO-8601 `(year, week)` for the instant, used to bucket the "latest
/// per ISO week" tier (§4.H). ISO weeks start Monday and belong to the
/// year containing their Thursday.
fn iso_week(micros: i64) -> (i64, u32) {
    let days_since_epoch = micros.div_euclid(86_400 * 1_000_000);
    // 1970-01-01 was a Thursday: weekday 0 = Monday .. 6 = Sunday.
    let weekday = (days_since_epoch + 3).rem_euclid(7);
    let thursday_days = days_since_epoch - weekday + 3;
    let (thursday_year, _, _) = civil_from_days(thursday_days);

    let jan1 = days_from_civil(thursday_year, 1, 1).unwrap_or(thursday_days);
    let week = (thursday_days - jan1) / 7 + 1;
    (thursday_year, week as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Action, DedupObject, FileVersion};
    use test_support::TempBackupRoot;

    fn version(path: &str, timestamp: &str) -> FileVersion {
        FileVersion {
            path: path.to_string(),
            timestamp: timestamp.to_string(),
            plaintext_size: 4,
            plaintext_hash: "hash".to_string(),
            action: Action::Modified,
            storage: StorageDescriptor::DedupRef("hash".to_string()),
            compressed: false,
            encrypted: false,
            encryption: None,
            stored_size: None,
        }
    }

    #[test]
    fn keeps_everything_under_a_day_old() {
        let now = parse_timestamp("2026-01-02_00-00-00-000000").unwrap();
        let timestamps = vec![
            "2026-01-01_23-00-00-000000".to_string(),
            "2026-01-01_12-00-00-000000".to_string(),
        ];
        assert!(versions_to_retire(&timestamps, now).is_empty());
    }

    #[test]
    fn collapses_same_day_versions_older_than_a_day() {
        let now = parse_timestamp("2026-01-10_00-00-00-000000").unwrap();
        let timestamps = vec![
            "2026-01-05_08-00-00-000000".to_string(),
            "2026-01-05_20-00-00-000000".to_string(),
        ];
        let retired = versions_to_retire(&timestamps, now);
        assert_eq!(retired, vec!["2026-01-05_08-00-00-000000".to_string()]);
    }

    #[test]
    fn drops_everything_beyond_a_year() {
        let now = parse_timestamp("2026-01-10_00-00-00-000000").unwrap();
        let timestamps = vec!["2024-01-01_00-00-00-000000".to_string()];
        let retired = versions_to_retire(&timestamps, now);
        assert_eq!(retired, timestamps);
    }

    #[test]
    fn unparseable_timestamps_are_never_retired() {
        let now = parse_timestamp("2026-01-10_00-00-00-000000").unwrap();
        let timestamps = vec!["garbage".to_string()];
        assert!(versions_to_retire(&timestamps, now).is_empty());
    }

    #[test]
    fn prune_path_decrements_ref_count_and_deletes_record() {
        let root = TempBackupRoot::new();
        let catalog = Catalog::open_in_memory().unwrap();
        catalog
            .insert_dedup(&DedupObject {
                hash: "hash".to_string(),
                blob_path: "dedup_store/ha/sh/hash".to_string(),
                original_size: 4,
                stored_size: 4,
                compressed: false,
                encrypted: false,
                encryption: None,
                ref_count: 2,
            })
            .unwrap();
        catalog
            .insert_file_version(&version("a.txt", "2024-01-01_00-00-00-000000"))
            .unwrap();
        catalog
            .insert_file_version(&version("a.txt", "2026-01-09_00-00-00-000000"))
            .unwrap();

        let now = parse_timestamp("2026-01-10_00-00-00-000000").unwrap();
        let report = prune_path(&catalog, root.path(), "a.txt", now).unwrap();

        assert_eq!(report.retired, vec!["2024-01-01_00-00-00-000000".to_string()]);
        assert!(catalog
            .get_version("a.txt", "2024-01-01_00-00-00-000000")
            .unwrap()
            .is_none());
        assert!(catalog
            .get_version("a.txt", "2026-01-09_00-00-00-000000")
            .unwrap()
            .is_some());
        let dedup = catalog.get_dedup("hash").unwrap().unwrap();
        assert_eq!(dedup.ref_count, 1);
    }

    #[test]
    fn prune_path_removes_direct_blob_file() {
        let root = TempBackupRoot::new();
        let catalog = Catalog::open_in_memory().unwrap();
        let blob_path = "versions/2024-01-01_00-00-00-000000/a.txt";
        store::blob::write_blob(root.path(), Path::new(blob_path), b"v1").unwrap();

        let direct_version = FileVersion {
            path: "a.txt".to_string(),
            timestamp: "2024-01-01_00-00-00-000000".to_string(),
            plaintext_size: 2,
            plaintext_hash: "hash".to_string(),
            action: Action::Modified,
            storage: StorageDescriptor::BlobPath(blob_path.to_string()),
            compressed: false,
            encrypted: false,
            encryption: None,
            stored_size: Some(2),
        };
        catalog.insert_file_version(&direct_version).unwrap();

        let now = parse_timestamp("2026-01-10_00-00-00-000000").unwrap();
        let report = prune_path(&catalog, root.path(), "a.txt", now).unwrap();

        assert_eq!(report.retired, vec!["2024-01-01_00-00-00-000000".to_string()]);
        assert!(!store::blob::blob_exists(root.path(), Path::new(blob_path)));
    }

    #[test]
    fn prune_all_covers_every_path() {
        let root = TempBackupRoot::new();
        let catalog = Catalog::open_in_memory().unwrap();
        catalog
            .insert_dedup(&DedupObject {
                hash: "hash".to_string(),
                blob_path: "dedup_store/ha/sh/hash".to_string(),
                original_size: 4,
                stored_size: 4,
                compressed: false,
                encrypted: false,
                encryption: None,
                ref_count: 2,
            })
            .unwrap();
        catalog
            .insert_file_version(&version("a.txt", "2024-01-01_00-00-00-000000"))
            .unwrap();
        catalog
            .insert_file_version(&version("b.txt", "2024-01-01_00-00-00-000000"))
            .unwrap();

        let now = parse_timestamp("2026-01-10_00-00-00-000000").unwrap();
        let reports = prune_all(&catalog, root.path(), now).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.retired.len() == 1));
    }
}
