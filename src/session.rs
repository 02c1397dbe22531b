//! The repository being edited and its live snapshot.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::git::{
    reconcile, GitRepository, HistoryError, LostEdit, LostEditDecision, RepositorySnapshot,
    RewriteCoordinator, RewriteOutcome,
};

/// Holds the one live snapshot and the path it was loaded from.
///
/// The snapshot is replaced as a whole on load, reload and apply; edits go
/// through [`Session::snapshot_mut`] and the record setters.
#[derive(Debug, Clone)]
pub struct Session {
    snapshot: RepositorySnapshot,
}

impl Session {
    /// Loads `path` at startup.
    ///
    /// When no repository is found the session starts empty on that path;
    /// any other failure to read the repository is returned.
    pub fn initial_load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let snapshot = match RepositorySnapshot::load(path) {
            Ok(snapshot) => snapshot,
            Err(e) if is_not_found(&e) => {
                debug!("Starting with an empty snapshot: {e:#}");
                RepositorySnapshot::empty(
                    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
                )
            }
            Err(e) => return Err(e.context(format!("Failed to load {}", path.display()))),
        };

        Ok(Self { snapshot })
    }

    /// Loads `path`, failing when it holds no repository.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            snapshot: RepositorySnapshot::load(path)?,
        })
    }

    /// Path of the current repository.
    pub fn repo_path(&self) -> &Path {
        self.snapshot.path()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> &RepositorySnapshot {
        &self.snapshot
    }

    /// Current snapshot, for editing records.
    pub fn snapshot_mut(&mut self) -> &mut RepositorySnapshot {
        &mut self.snapshot
    }

    /// Whether any record has pending edits.
    pub fn any_changes(&self) -> bool {
        self.snapshot.any_changes()
    }

    /// Switches to the repository at `path`, carrying pending edits along.
    ///
    /// Fails with [`HistoryError::RepositoryNotFound`] and keeps the current
    /// state when there is no repository at `path`. Returns `false` when `ask`
    /// aborted because edits would be lost; the session is then unchanged.
    pub fn load<P, F>(&mut self, path: P, ask: F) -> Result<bool>
    where
        P: AsRef<Path>,
        F: FnMut(&LostEdit<'_>) -> LostEditDecision,
    {
        let fresh = RepositorySnapshot::load(path)?;
        Ok(self.replace(fresh, ask))
    }

    /// Reloads the current repository, carrying pending edits along.
    pub fn reload<F>(&mut self, ask: F) -> Result<bool>
    where
        F: FnMut(&LostEdit<'_>) -> LostEditDecision,
    {
        let path = self.repo_path().to_path_buf();
        let fresh = RepositorySnapshot::load(&path).map_err(|e| {
            if is_not_found(&e) {
                warn!("{} no longer holds a repository", path.display());
            }
            e
        })?;
        Ok(self.replace(fresh, ask))
    }

    /// Writes pending edits into the repository and reloads it.
    ///
    /// The repository must still match the snapshot; see
    /// [`RewriteCoordinator::apply`].
    pub fn apply(&mut self) -> Result<RewriteOutcome> {
        let mut repo = GitRepository::open_at(self.repo_path())?;
        let applied = RewriteCoordinator::new(&mut repo)
            .apply(&self.snapshot)
            .with_context(|| format!("Failed to apply changes to {}", self.repo_path().display()))?;

        self.snapshot = applied.snapshot;
        Ok(applied.outcome)
    }

    fn replace<F>(&mut self, mut fresh: RepositorySnapshot, ask: F) -> bool
    where
        F: FnMut(&LostEdit<'_>) -> LostEditDecision,
    {
        if !reconcile(&mut fresh, &self.snapshot, true, ask) {
            return false;
        }
        self.snapshot = fresh;
        true
    }
}

/// Whether an error reports a missing repository.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<HistoryError>(),
            Some(HistoryError::RepositoryNotFound { .. })
        )
    })
}

/// Whether an error reports a repository that changed since loading.
pub fn is_diverged(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<HistoryError>(),
            Some(HistoryError::RepositoryDiverged { .. })
        )
    })
}
