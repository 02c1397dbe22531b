//! Applying snapshot edits to the repository.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::git::{
    validate_unchanged, CommitRecord, HeaderRewrite, HistoryRepository, RepositorySnapshot,
    RewriteOutcome, BACKUP_REF_PREFIX,
};

/// Result of [`RewriteCoordinator::apply`].
#[derive(Debug)]
pub struct AppliedRewrite {
    /// What the rewrite changed.
    pub outcome: RewriteOutcome,
    /// The history as reloaded after the rewrite.
    pub snapshot: RepositorySnapshot,
}

/// Writes the edits of a snapshot back into its repository.
pub struct RewriteCoordinator<'a, R: HistoryRepository + ?Sized> {
    repo: &'a mut R,
}

impl<'a, R: HistoryRepository + ?Sized> RewriteCoordinator<'a, R> {
    /// Creates a coordinator for an opened repository.
    pub fn new(repo: &'a mut R) -> Self {
        Self { repo }
    }

    /// Rewrites the repository so it carries the snapshot's current values.
    ///
    /// Refuses with [`HistoryError::RepositoryDiverged`](crate::git::HistoryError)
    /// when the repository changed since the snapshot was loaded. Leftover
    /// backup references are deleted first, then every commit is passed
    /// through the rewrite and the history is reloaded.
    ///
    /// The old history stays reachable through the backup references until
    /// the next apply removes them.
    pub fn apply(&mut self, snapshot: &RepositorySnapshot) -> Result<AppliedRewrite> {
        let live = self.repo.commits().context("Failed to read repository history")?;
        validate_unchanged(snapshot.records(), &live)?;

        self.remove_backup_refs()?;

        let known: HashMap<&str, &CommitRecord> = snapshot
            .records()
            .iter()
            .map(|record| (record.hash(), record))
            .collect();
        let hashes = live.iter().map(|commit| commit.hash.clone()).collect::<Vec<_>>();

        info!(
            "Rewriting {} commits ({} edited)",
            hashes.len(),
            snapshot.modified().count()
        );

        let outcome = self
            .repo
            .rewrite_history(&hashes, &mut |commit| {
                known.get(commit.hash.as_str()).map(|record| header_for(record))
            })
            .context("Failed to rewrite history")?;

        info!(
            "Rewrote {} commits, updated {} references",
            outcome.rewritten.len(),
            outcome.updated_refs.len()
        );

        let snapshot = RepositorySnapshot::from_repository(&*self.repo, snapshot.path().to_path_buf())
            .context("Failed to reload history after rewrite")?;

        Ok(AppliedRewrite { outcome, snapshot })
    }

    fn remove_backup_refs(&mut self) -> Result<()> {
        for name in self.repo.references_with_prefix(BACKUP_REF_PREFIX)? {
            debug!("Removing backup reference {name}");
            self.repo.delete_reference(&name)?;
        }
        Ok(())
    }
}

/// The header a record asks for.
pub fn header_for(record: &CommitRecord) -> HeaderRewrite {
    HeaderRewrite {
        message: record.message().to_string(),
        author: record.author().clone(),
        committer: record.committer().clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::git::record::tests::live;
    use crate::git::{HistoryError, LiveCommit};
    use std::path::PathBuf;

    /// In-memory repository with a linear history, newest first.
    #[derive(Default)]
    struct FakeRepo {
        commits: Vec<LiveCommit>,
        refs: Vec<String>,
        rewrites: usize,
    }

    impl HistoryRepository for FakeRepo {
        fn commits(&self) -> Result<Vec<LiveCommit>> {
            Ok(self.commits.clone())
        }

        fn references_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
            Ok(self.refs.iter().filter(|r| r.starts_with(prefix)).cloned().collect())
        }

        fn delete_reference(&mut self, name: &str) -> Result<()> {
            self.refs.retain(|r| r != name);
            Ok(())
        }

        fn rewrite_history(
            &mut self,
            hashes: &[String],
            rewrite: &mut dyn FnMut(&LiveCommit) -> Option<HeaderRewrite>,
        ) -> Result<RewriteOutcome> {
            if !self.references_with_prefix(BACKUP_REF_PREFIX)?.is_empty() {
                anyhow::bail!("backups exist");
            }
            self.rewrites += 1;

            let mut outcome = RewriteOutcome::default();
            let mut changed_below = false;
            // oldest first, so every descendant of an edit gets a new hash
            for commit in self.commits.iter_mut().rev() {
                assert!(hashes.contains(&commit.hash));
                let header = rewrite(commit);
                let edited = header.as_ref().is_some_and(|h| {
                    h.message != commit.message || h.author != commit.author || h.committer != commit.committer
                });
                if let Some(header) = header.filter(|_| edited) {
                    commit.message = header.message;
                    commit.author = header.author;
                    commit.committer = header.committer;
                }
                if edited || changed_below {
                    changed_below = true;
                    let new_hash = format!("{}'", commit.hash);
                    outcome.rewritten.insert(commit.hash.clone(), new_hash.clone());
                    commit.hash = new_hash;
                }
            }
            if changed_below {
                self.refs.push(format!("{BACKUP_REF_PREFIX}heads/main"));
                outcome.updated_refs.push("refs/heads/main".to_string());
            }
            Ok(outcome)
        }
    }

    fn fake() -> FakeRepo {
        FakeRepo {
            commits: vec![live("c3", "three\n"), live("c2", "two\n"), live("c1", "one\n")],
            ..FakeRepo::default()
        }
    }

    fn load(repo: &FakeRepo) -> RepositorySnapshot {
        RepositorySnapshot::from_repository(repo, PathBuf::from("/repo")).unwrap()
    }

    #[test]
    fn apply_rewrites_descendants_and_reloads() {
        let mut repo = fake();
        let mut snapshot = load(&repo);
        snapshot.find_mut("c2").unwrap().set_message("edited two\n");

        let applied = RewriteCoordinator::new(&mut repo).apply(&snapshot).unwrap();

        let hashes = applied
            .snapshot
            .records()
            .iter()
            .map(|r| r.hash().to_string())
            .collect::<Vec<_>>();
        assert_eq!(hashes, vec!["c3'", "c2'", "c1"]);
        assert_eq!(applied.snapshot.find("c2'").unwrap().message(), "edited two\n");
        assert!(!applied.snapshot.any_changes());
        assert_eq!(applied.outcome.rewritten.len(), 2);
    }

    #[test]
    fn apply_clears_old_backups_first() {
        let mut repo = fake();
        repo.refs = vec![
            format!("{BACKUP_REF_PREFIX}heads/main"),
            "refs/heads/main".to_string(),
        ];
        let mut snapshot = load(&repo);
        snapshot.find_mut("c1").unwrap().set_author_name("Grace");

        RewriteCoordinator::new(&mut repo).apply(&snapshot).unwrap();

        assert_eq!(repo.rewrites, 1);
        assert!(repo.refs.contains(&"refs/heads/main".to_string()));
    }

    #[test]
    fn diverged_repository_is_not_touched() {
        let mut repo = fake();
        let mut snapshot = load(&repo);
        snapshot.find_mut("c2").unwrap().set_message("edited two\n");
        repo.commits.insert(0, live("c4", "four\n"));
        repo.refs = vec![format!("{BACKUP_REF_PREFIX}heads/main")];

        let err = RewriteCoordinator::new(&mut repo).apply(&snapshot).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<HistoryError>(),
            Some(HistoryError::RepositoryDiverged { .. })
        ));
        assert_eq!(repo.rewrites, 0);
        assert_eq!(repo.refs.len(), 1);
    }
}
