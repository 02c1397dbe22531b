//! Loaded commit lists and carrying edits across reloads.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::git::{short_hash, CommitRecord, GitRepository, HistoryRepository};

/// Point-in-time copy of a repository's commits, open for editing.
#[derive(Debug, Clone, Default)]
pub struct RepositorySnapshot {
    path: PathBuf,
    records: Vec<CommitRecord>,
}

impl RepositorySnapshot {
    /// Loads every commit reachable from HEAD of the repository at `path`.
    ///
    /// Fails with [`HistoryError::RepositoryNotFound`](crate::git::HistoryError)
    /// when there is no repository at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = std::path::absolute(path.as_ref())
            .with_context(|| format!("Failed to resolve path {}", path.as_ref().display()))?;
        let repo = GitRepository::open_at(&path)?;
        Self::from_repository(&repo, path)
    }

    /// Builds a snapshot from an already opened repository.
    pub fn from_repository<R: HistoryRepository + ?Sized>(repo: &R, path: PathBuf) -> Result<Self> {
        let records = repo
            .commits()?
            .into_iter()
            .map(CommitRecord::new)
            .collect::<Vec<_>>();

        info!("Loaded {} commits from {}", records.len(), path.display());
        Ok(Self { path, records })
    }

    /// An empty snapshot for a path holding no repository.
    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            records: Vec::new(),
        }
    }

    /// Absolute path of the repository.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records in traversal order, newest first.
    pub fn records(&self) -> &[CommitRecord] {
        &self.records
    }

    /// Number of commits.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no commits.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Finds the record of a commit.
    pub fn find(&self, hash: &str) -> Option<&CommitRecord> {
        self.records.iter().find(|record| record.hash() == hash)
    }

    /// Finds the record of a commit for editing.
    pub fn find_mut(&mut self, hash: &str) -> Option<&mut CommitRecord> {
        self.records.iter_mut().find(|record| record.hash() == hash)
    }

    /// Records with pending edits.
    pub fn modified(&self) -> impl Iterator<Item = &CommitRecord> {
        self.records.iter().filter(|record| record.is_modified())
    }

    /// Whether any record has pending edits.
    pub fn any_changes(&self) -> bool {
        self.records.iter().any(CommitRecord::is_modified)
    }

    /// Discards the edits of every record.
    pub fn undo_all(&mut self) {
        self.records.iter_mut().for_each(CommitRecord::undo);
    }

    /// Links the committer to the author on every record.
    pub fn set_all_committer_equals_author(&mut self) {
        for record in &mut self.records {
            record.set_committer_equals_author(true);
        }
    }
}

/// A pending edit to a commit that a newly loaded history no longer contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LostEdit<'a> {
    /// Hash of the edited commit.
    pub hash: &'a str,
}

/// Answer to a [`LostEdit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LostEditDecision {
    /// Drop this edit and continue.
    Discard,
    /// Drop this edit and every further one in the same pass without asking.
    DiscardAll,
    /// Stop and keep the previous state.
    Abort,
}

/// Asks about lost edits until told to discard them all.
///
/// The "discard all" answer lives only as long as the gate; create one gate
/// per reconciliation pass.
pub struct LostEditGate<F> {
    ask: F,
    discard_all: bool,
}

impl<F> LostEditGate<F>
where
    F: FnMut(&LostEdit<'_>) -> LostEditDecision,
{
    /// Creates a gate asking through `ask`.
    pub fn new(ask: F) -> Self {
        Self {
            ask,
            discard_all: false,
        }
    }

    /// Returns whether the edit may be dropped.
    pub fn allow_discard(&mut self, lost: &LostEdit<'_>) -> bool {
        if self.discard_all {
            debug!("Discarding edits to {} without asking", short_hash(lost.hash));
            return true;
        }

        match (self.ask)(lost) {
            LostEditDecision::Discard => true,
            LostEditDecision::DiscardAll => {
                self.discard_all = true;
                true
            }
            LostEditDecision::Abort => false,
        }
    }
}

/// Carries the edits of `previous` forward onto `fresh`.
///
/// Every modified record of `previous` whose commit is in `fresh` has its
/// editable fields copied over. For a modified record whose commit is missing,
/// `ask` decides when `warn_if_no_match` is set; otherwise the edit is dropped
/// silently. Returns `false` when `ask` aborted; the caller should then keep
/// `previous` and throw `fresh` away.
pub fn reconcile<F>(
    fresh: &mut RepositorySnapshot,
    previous: &RepositorySnapshot,
    warn_if_no_match: bool,
    ask: F,
) -> bool
where
    F: FnMut(&LostEdit<'_>) -> LostEditDecision,
{
    let mut gate = LostEditGate::new(ask);

    for old in previous.modified() {
        if let Some(record) = fresh.find_mut(old.hash()) {
            record.restore_from(old);
            continue;
        }

        debug!("Edited commit {} is not in the new history", short_hash(old.hash()));
        if warn_if_no_match && !gate.allow_discard(&LostEdit { hash: old.hash() }) {
            info!("Reload cancelled to keep edits to {}", short_hash(old.hash()));
            return false;
        }
    }

    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::git::record::tests::live;
    use crate::git::LiveCommit;

    fn snapshot(commits: &[LiveCommit]) -> RepositorySnapshot {
        RepositorySnapshot {
            path: PathBuf::from("/repo"),
            records: commits.iter().cloned().map(CommitRecord::new).collect(),
        }
    }

    fn history() -> Vec<LiveCommit> {
        vec![live("c3", "three\n"), live("c2", "two\n"), live("c1", "one\n")]
    }

    #[test]
    fn bulk_undo_and_link() {
        let mut snap = snapshot(&history());
        assert!(!snap.any_changes());

        snap.find_mut("c2").unwrap().set_message("edited\n");
        snap.find_mut("c1").unwrap().set_committer_name("Other");
        assert_eq!(snap.modified().count(), 2);

        snap.set_all_committer_equals_author();
        assert!(snap
            .records()
            .iter()
            .all(|r| r.committer_equals_author() && r.committer() == r.author()));
        assert_eq!(snap.modified().count(), 1);

        snap.undo_all();
        assert!(!snap.any_changes());
    }

    #[test]
    fn edits_follow_matching_hashes() {
        let mut previous = snapshot(&history());
        previous.find_mut("c2").unwrap().set_message("edited two\n");
        previous.find_mut("c1").unwrap().set_author_email("new@example.com");

        let mut reordered = history();
        reordered.reverse();
        let mut fresh = snapshot(&reordered);

        let completed = reconcile(&mut fresh, &previous, true, |_| {
            panic!("no edit should be lost")
        });

        assert!(completed);
        assert_eq!(fresh.find("c2").unwrap().message(), "edited two\n");
        assert_eq!(fresh.find("c1").unwrap().author().email, "new@example.com");
        assert_eq!(fresh.find("c1").unwrap().committer().email, "new@example.com");
        assert!(!fresh.find("c3").unwrap().is_modified());
    }

    fn lost_two() -> (RepositorySnapshot, RepositorySnapshot) {
        let mut previous = snapshot(&history());
        previous.find_mut("c3").unwrap().set_message("edited three\n");
        previous.find_mut("c2").unwrap().set_message("edited two\n");
        previous.find_mut("c1").unwrap().set_message("edited one\n");

        // c3 and c2 were removed from the branch
        let fresh = snapshot(&history()[2..]);
        (previous, fresh)
    }

    #[test]
    fn discard_all_asks_once() {
        let (previous, mut fresh) = lost_two();
        let mut asked = Vec::new();

        let completed = reconcile(&mut fresh, &previous, true, |lost| {
            asked.push(lost.hash.to_string());
            LostEditDecision::DiscardAll
        });

        assert!(completed);
        assert_eq!(asked, vec!["c3".to_string()]);
        assert_eq!(fresh.find("c1").unwrap().message(), "edited one\n");
    }

    #[test]
    fn discard_asks_for_each() {
        let (previous, mut fresh) = lost_two();
        let mut asked = 0;

        let completed = reconcile(&mut fresh, &previous, true, |_| {
            asked += 1;
            LostEditDecision::Discard
        });

        assert!(completed);
        assert_eq!(asked, 2);
    }

    #[test]
    fn discard_all_does_not_carry_over_to_next_pass() {
        let (previous, fresh) = lost_two();
        let mut asked = 0;

        for _ in 0..2 {
            let mut attempt = fresh.clone();
            reconcile(&mut attempt, &previous, true, |_| {
                asked += 1;
                LostEditDecision::DiscardAll
            });
        }

        assert_eq!(asked, 2);
    }

    #[test]
    fn abort_stops_reconciliation() {
        let (previous, mut fresh) = lost_two();
        let mut asked = 0;

        let completed = reconcile(&mut fresh, &previous, true, |_| {
            asked += 1;
            LostEditDecision::Abort
        });

        assert!(!completed);
        assert_eq!(asked, 1);
        assert_eq!(previous.modified().count(), 3);
    }

    #[test]
    fn silent_when_not_warning() {
        let (previous, mut fresh) = lost_two();

        let completed = reconcile(&mut fresh, &previous, false, |_| {
            panic!("must not ask")
        });

        assert!(completed);
    }
}
