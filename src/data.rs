//! Data processing and serialization.

use serde::{Deserialize, Serialize};

use crate::git::{CommitRecord, Identity, RepositorySnapshot};

pub mod edits;
pub mod timestamp;
pub mod yaml;

pub use edits::{CommitEdit, EditsFile, IdentityEdit, ImportSummary};
pub use timestamp::{format_timestamp, parse_timestamp};
pub use yaml::*;

/// Repository view printed by the `view` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotView {
    /// Version information for the git-rehead tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<VersionInfo>,
    /// Where the commits were loaded from.
    pub repository: RepositoryInfo,
    /// Commits newest first.
    pub commits: Vec<CommitView>,
}

/// Version information for tools and environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Version of the git-rehead tool.
    pub git_rehead: String,
}

/// Repository location and branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Absolute path of the repository.
    pub path: String,
    /// Current branch, absent when HEAD is detached or unborn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Number of commits reachable from HEAD.
    pub commit_count: usize,
    /// Number of commits with pending edits.
    pub modified_count: usize,
}

/// One commit in the view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitView {
    /// Full SHA-1 hash of the commit.
    pub hash: String,
    /// Current message.
    pub message: String,
    /// Current author.
    pub author: Identity,
    /// Current committer.
    pub committer: Identity,
    /// Whether the committer follows the author.
    pub committer_equals_author: bool,
    /// Whether the commit has pending edits.
    pub modified: bool,
}

impl CommitView {
    /// Builds the view of a record.
    pub fn from_record(record: &CommitRecord) -> Self {
        Self {
            hash: record.hash().to_string(),
            message: record.message().to_string(),
            author: record.author().clone(),
            committer: record.committer().clone(),
            committer_equals_author: record.committer_equals_author(),
            modified: record.is_modified(),
        }
    }
}

impl SnapshotView {
    /// Builds the view of a snapshot.
    pub fn new(snapshot: &RepositorySnapshot, branch: Option<String>) -> Self {
        Self {
            versions: Some(VersionInfo {
                git_rehead: crate::VERSION.to_string(),
            }),
            repository: RepositoryInfo {
                path: snapshot.path().display().to_string(),
                branch,
                commit_count: snapshot.len(),
                modified_count: snapshot.modified().count(),
            },
            commits: snapshot.records().iter().map(CommitView::from_record).collect(),
        }
    }
}
