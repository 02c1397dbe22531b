//! Failure conditions of the load, reconcile and rewrite workflow.

use std::path::PathBuf;

use thiserror::Error;

/// Errors a caller is expected to recognise and act on.
///
/// These travel inside `anyhow::Error`; use `downcast_ref::<HistoryError>()`
/// to tell them apart from plain git or IO failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// No valid Git repository exists at the path.
    #[error("There is no valid Git repository at {}", path.display())]
    RepositoryNotFound {
        /// The path that was tried.
        path: PathBuf,
    },

    /// The repository no longer matches the snapshot it was loaded into.
    #[error("The repository has changed since it was last loaded ({detail}). Reload before applying changes")]
    RepositoryDiverged {
        /// The first difference found.
        detail: String,
    },

    /// Backup references from an earlier rewrite are still present.
    #[error("Backup references already exist under {prefix}")]
    BackupRefsExist {
        /// The backup namespace.
        prefix: String,
    },
}
