//! Git history access, edit tracking and rewriting.

pub mod error;
pub mod identity;
pub mod record;
pub mod repository;
pub mod rewrite;
pub mod snapshot;
pub mod validate;

pub use error::HistoryError;
pub use identity::Identity;
pub use record::{CommitRecord, LiveCommit};
pub use repository::{GitRepository, HeaderRewrite, HistoryRepository, RewriteOutcome};
pub use rewrite::{AppliedRewrite, RewriteCoordinator};
pub use snapshot::{reconcile, LostEdit, LostEditDecision, LostEditGate, RepositorySnapshot};
pub use validate::validate_unchanged;

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;

/// Length of a full SHA-1 commit hash in hex characters.
pub const FULL_HASH_LEN: usize = 40;

/// Namespace holding the references backed up by a rewrite.
pub const BACKUP_REF_PREFIX: &str = "refs/original/";

/// Returns the abbreviated form of a commit hash.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..SHORT_HASH_LEN).unwrap_or(hash)
}
