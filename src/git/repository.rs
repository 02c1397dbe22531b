//! Git repository access.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{ErrorCode, Oid, Repository, Sort};
use tracing::{debug, info};

use crate::git::{short_hash, HistoryError, Identity, LiveCommit, BACKUP_REF_PREFIX};

/// New header for one rewritten commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRewrite {
    /// Replacement message.
    pub message: String,
    /// Replacement author.
    pub author: Identity,
    /// Replacement committer.
    pub committer: Identity,
}

/// Result of a history rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Old hash to new hash for every commit that received a new object.
    pub rewritten: HashMap<String, String>,
    /// References moved to the rewritten history.
    pub updated_refs: Vec<String>,
}

/// Capabilities the rewrite workflow needs from a repository.
pub trait HistoryRepository {
    /// Lists the commits reachable from HEAD, newest first.
    fn commits(&self) -> Result<Vec<LiveCommit>>;

    /// Lists the names of references starting with `prefix`.
    fn references_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Deletes a reference.
    fn delete_reference(&mut self, name: &str) -> Result<()>;

    /// Rewrites the headers of `hashes` and everything descending from them.
    ///
    /// `rewrite` returns the new header for a commit, or `None` to keep it.
    /// Trees are preserved. References pointing into the rewritten history
    /// are backed up under [`BACKUP_REF_PREFIX`] and moved to the new commits.
    fn rewrite_history(
        &mut self,
        hashes: &[String],
        rewrite: &mut dyn FnMut(&LiveCommit) -> Option<HeaderRewrite>,
    ) -> Result<RewriteOutcome>;
}

/// Git repository wrapper.
pub struct GitRepository {
    repo: Repository,
    path: PathBuf,
}

impl GitRepository {
    /// Opens the repository at the given path.
    ///
    /// Fails with [`HistoryError::RepositoryNotFound`] when `path` holds no
    /// valid repository.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|e| {
            debug!("Opening {} failed: {e}", path.display());
            HistoryError::RepositoryNotFound {
                path: path.to_path_buf(),
            }
        })?;

        Ok(Self {
            repo,
            path: path.to_path_buf(),
        })
    }

    /// Path the repository was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Access to the underlying git2::Repository.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Returns the current branch name, or `None` when HEAD is detached or unborn.
    pub fn current_branch(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        if !head.is_branch() {
            return None;
        }
        head.shorthand().map(str::to_string)
    }

    fn head_oid(&self) -> Result<Option<Oid>> {
        match self.repo.head() {
            Ok(head) => {
                let commit = head.peel_to_commit().context("Failed to peel HEAD to commit")?;
                Ok(Some(commit.id()))
            }
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(None)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to get HEAD reference")),
        }
    }

    /// Commits targeted by a reference or detached HEAD that equal or descend
    /// from one of `targets`.
    fn affected_tips(&self, targets: &HashSet<Oid>) -> Result<Vec<Oid>> {
        let mut candidates = Vec::new();
        for reference in self.repo.references().context("Failed to list references")? {
            let reference = reference.context("Failed to read reference")?;
            if reference.name().is_some_and(|name| name.starts_with(BACKUP_REF_PREFIX)) {
                continue;
            }
            candidates.extend(reference.target());
        }
        if self.is_head_detached()? {
            candidates.extend(self.repo.head().ok().and_then(|head| head.target()));
        }

        // Annotated tags and non-commit targets stay where they are.
        let mut tips = Vec::new();
        for tip in candidates {
            if tips.contains(&tip) || self.repo.find_commit(tip).is_err() {
                continue;
            }
            if self.reaches_any(tip, targets)? {
                tips.push(tip);
            }
        }
        Ok(tips)
    }

    fn reaches_any(&self, tip: Oid, targets: &HashSet<Oid>) -> Result<bool> {
        if targets.contains(&tip) {
            return Ok(true);
        }
        for target in targets {
            if self
                .repo
                .graph_descendant_of(tip, *target)
                .with_context(|| format!("Failed to compare {tip} with {target}"))?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn is_head_detached(&self) -> Result<bool> {
        match self.repo.head_detached() {
            Ok(detached) => Ok(detached),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(false)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to check whether HEAD is detached")),
        }
    }

    /// Creates the replacement commit objects, parents first.
    ///
    /// Every commit reachable from `tips` is visited. Only commits in `targets`
    /// go through `rewrite`; the others are recreated when a parent changed.
    fn rewrite_objects(
        &self,
        targets: &HashSet<Oid>,
        tips: &[Oid],
        rewrite: &mut dyn FnMut(&LiveCommit) -> Option<HeaderRewrite>,
    ) -> Result<HashMap<Oid, Oid>> {
        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker
            .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
            .context("Failed to set revwalk order")?;
        for oid in targets.iter().chain(tips) {
            walker
                .push(*oid)
                .with_context(|| format!("Failed to push commit {oid}"))?;
        }

        let mut mapping: HashMap<Oid, Oid> = HashMap::new();

        for oid in walker {
            let oid = oid.context("Failed to get commit OID from walker")?;
            let commit = self
                .repo
                .find_commit(oid)
                .with_context(|| format!("Commit not found: {oid}"))?;

            let original_parents = commit.parent_ids().collect::<Vec<_>>();
            let parents = original_parents
                .iter()
                .map(|parent| mapping.get(parent).copied().unwrap_or(*parent))
                .collect::<Vec<_>>();
            let parents_changed = parents != original_parents;

            let live = LiveCommit::from_git_commit(&commit)?;
            let header = targets
                .contains(&oid)
                .then(|| rewrite(&live))
                .flatten()
                .filter(|header| {
                    header.message != live.message
                        || header.author != live.author
                        || header.committer != live.committer
                });

            if header.is_none() && !parents_changed {
                continue;
            }

            let (message, author, committer) = match &header {
                Some(header) => (header.message.as_str(), &header.author, &header.committer),
                None => (live.message.as_str(), &live.author, &live.committer),
            };

            let parent_commits = parents
                .iter()
                .map(|parent| {
                    self.repo
                        .find_commit(*parent)
                        .with_context(|| format!("Parent commit not found: {parent}"))
                })
                .collect::<Result<Vec<_>>>()?;
            let parent_refs = parent_commits.iter().collect::<Vec<_>>();
            let tree = commit.tree().context("Failed to get commit tree")?;

            let new_oid = self
                .repo
                .commit(
                    None,
                    &author.to_signature()?,
                    &committer.to_signature()?,
                    message,
                    &tree,
                    &parent_refs,
                )
                .with_context(|| format!("Failed to write rewritten commit for {oid}"))?;

            debug!(
                "Rewrote {} -> {}",
                short_hash(&oid.to_string()),
                short_hash(&new_oid.to_string())
            );
            mapping.insert(oid, new_oid);
        }

        Ok(mapping)
    }

    /// Backs up and moves every reference whose target was rewritten.
    fn update_references(&self, mapping: &HashMap<Oid, Oid>) -> Result<Vec<String>> {
        let mut moves = Vec::new();

        for reference in self.repo.references().context("Failed to list references")? {
            let reference = reference.context("Failed to read reference")?;
            let Some(name) = reference.name() else {
                continue;
            };
            if name.starts_with(BACKUP_REF_PREFIX) {
                continue;
            }
            // Symbolic references follow their target; annotated tags are kept.
            let Some(target) = reference.target() else {
                continue;
            };
            if let Some(new_target) = mapping.get(&target) {
                moves.push((name.to_string(), target, *new_target));
            }
        }

        let mut updated = Vec::with_capacity(moves.len());
        for (name, old, new) in moves {
            let backup = format!("{BACKUP_REF_PREFIX}{}", name.trim_start_matches("refs/"));
            self.repo
                .reference(&backup, old, false, "rewrite: backup")
                .with_context(|| format!("Failed to create backup reference {backup}"))?;

            let mut reference = self
                .repo
                .find_reference(&name)
                .with_context(|| format!("Failed to find reference {name}"))?;
            reference
                .set_target(new, "rewrite: header rewrite")
                .with_context(|| format!("Failed to update reference {name}"))?;

            info!(
                "Updated {name}: {} -> {}",
                short_hash(&old.to_string()),
                short_hash(&new.to_string())
            );
            updated.push(name);
        }

        if self.is_head_detached()? {
            if let Some(old) = self.repo.head().ok().and_then(|head| head.target()) {
                if let Some(new) = mapping.get(&old) {
                    self.repo
                        .set_head_detached(*new)
                        .context("Failed to move detached HEAD")?;
                    updated.push("HEAD".to_string());
                }
            }
        }

        Ok(updated)
    }
}

impl HistoryRepository for GitRepository {
    fn commits(&self) -> Result<Vec<LiveCommit>> {
        let Some(head) = self.head_oid()? else {
            debug!("HEAD of {} is unborn", self.path.display());
            return Ok(Vec::new());
        };

        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker
            .set_sorting(Sort::TIME)
            .context("Failed to set revwalk order")?;
        walker.push(head).context("Failed to push HEAD")?;

        walker
            .map(|oid| {
                let oid = oid.context("Failed to get commit OID from walker")?;
                let commit = self
                    .repo
                    .find_commit(oid)
                    .with_context(|| format!("Commit not found: {oid}"))?;
                LiveCommit::from_git_commit(&commit)
            })
            .collect()
    }

    fn references_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let glob = format!("{prefix}*");
        let references = self
            .repo
            .references_glob(&glob)
            .with_context(|| format!("Failed to list references matching {glob}"))?;

        let mut names = Vec::new();
        for reference in references {
            let reference = reference.context("Failed to read reference")?;
            if let Some(name) = reference.name() {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    fn delete_reference(&mut self, name: &str) -> Result<()> {
        let mut reference = self
            .repo
            .find_reference(name)
            .with_context(|| format!("Failed to find reference {name}"))?;
        reference
            .delete()
            .with_context(|| format!("Failed to delete reference {name}"))
    }

    fn rewrite_history(
        &mut self,
        hashes: &[String],
        rewrite: &mut dyn FnMut(&LiveCommit) -> Option<HeaderRewrite>,
    ) -> Result<RewriteOutcome> {
        if !self.references_with_prefix(BACKUP_REF_PREFIX)?.is_empty() {
            return Err(HistoryError::BackupRefsExist {
                prefix: BACKUP_REF_PREFIX.to_string(),
            }
            .into());
        }
        if hashes.is_empty() {
            return Ok(RewriteOutcome::default());
        }

        let targets = hashes
            .iter()
            .map(|hash| Oid::from_str(hash).with_context(|| format!("Invalid commit hash: {hash}")))
            .collect::<Result<HashSet<_>>>()?;
        let tips = self.affected_tips(&targets)?;
        debug!("Rewriting history below {} references", tips.len());

        let mapping = self.rewrite_objects(&targets, &tips, rewrite)?;
        let updated_refs = self.update_references(&mapping)?;

        Ok(RewriteOutcome {
            rewritten: mapping
                .into_iter()
                .map(|(old, new)| (old.to_string(), new.to_string()))
                .collect(),
            updated_refs,
        })
    }
}
