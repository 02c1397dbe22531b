//! Divergence check run before a rewrite.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use tracing::{debug, warn};

use crate::git::{short_hash, CommitRecord, HistoryError, LiveCommit};

/// Checks that the live repository still matches the loaded snapshot.
///
/// Passes only when both sides hold exactly the same set of hashes and every
/// live commit equals the *original* values of its record. Edits made to the
/// records do not matter. Fails with [`HistoryError::RepositoryDiverged`]
/// naming the first difference found.
pub fn validate_unchanged(records: &[CommitRecord], live: &[LiveCommit]) -> Result<()> {
    check(records, live).map_err(|detail| {
        warn!("Repository diverged from snapshot: {detail}");
        HistoryError::RepositoryDiverged { detail }.into()
    })
}

fn check(records: &[CommitRecord], live: &[LiveCommit]) -> Result<(), String> {
    let known: HashMap<&str, &CommitRecord> =
        records.iter().map(|record| (record.hash(), record)).collect();
    let live_hashes: HashSet<&str> = live.iter().map(|commit| commit.hash.as_str()).collect();

    if known.len() != live_hashes.len() {
        return Err(format!(
            "{} commits loaded, {} commits now",
            known.len(),
            live_hashes.len()
        ));
    }

    if let Some(missing) = records.iter().find(|r| !live_hashes.contains(r.hash())) {
        return Err(format!("commit {} is gone", short_hash(missing.hash())));
    }

    for commit in live {
        let Some(record) = known.get(commit.hash.as_str()) else {
            return Err(format!("commit {} is new", short_hash(&commit.hash)));
        };
        if !record.matches_original(commit) {
            return Err(format!("commit {} was changed", short_hash(&commit.hash)));
        }
    }

    debug!("Snapshot of {} commits matches the repository", live.len());
    Ok(())
}
