//! Editable commit metadata.

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use git2::Commit;

use crate::git::Identity;

/// Header fields of a commit as currently stored in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveCommit {
    /// Full hex object id.
    pub hash: String,
    /// Raw commit message.
    pub message: String,
    /// Author identity.
    pub author: Identity,
    /// Committer identity.
    pub committer: Identity,
}

impl LiveCommit {
    /// Reads the header fields of a git commit.
    pub fn from_git_commit(commit: &Commit<'_>) -> Result<Self> {
        Ok(Self {
            hash: commit.id().to_string(),
            message: String::from_utf8_lossy(commit.message_raw_bytes()).into_owned(),
            author: Identity::from_signature(&commit.author())?,
            committer: Identity::from_signature(&commit.committer())?,
        })
    }
}

/// One commit's editable metadata together with its pristine values.
///
/// While `committer_equals_author` is set the committer fields always equal
/// the author fields: author writes are mirrored onto the committer, and a
/// committer write that breaks the equality clears the flag.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    original: LiveCommit,
    message: String,
    author: Identity,
    committer: Identity,
    committer_equals_author: bool,
}

impl CommitRecord {
    /// Creates an unmodified record for a commit.
    pub fn new(original: LiveCommit) -> Self {
        let mut record = Self {
            message: original.message.clone(),
            author: original.author.clone(),
            committer: original.committer.clone(),
            committer_equals_author: false,
            original,
        };
        record.committer_equals_author = record.author == record.committer;
        record
    }

    /// Commit hash.
    pub fn hash(&self) -> &str {
        &self.original.hash
    }

    /// Values the commit had when it was loaded.
    pub fn original(&self) -> &LiveCommit {
        &self.original
    }

    /// Current message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Current author.
    pub fn author(&self) -> &Identity {
        &self.author
    }

    /// Current committer.
    pub fn committer(&self) -> &Identity {
        &self.committer
    }

    /// Whether committer fields follow the author fields.
    pub fn committer_equals_author(&self) -> bool {
        self.committer_equals_author
    }

    /// Sets the message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Sets the author name, mirroring it onto the committer when linked.
    pub fn set_author_name(&mut self, name: impl Into<String>) {
        self.author.name = name.into();
        if self.committer_equals_author {
            self.committer.name.clone_from(&self.author.name);
        }
    }

    /// Sets the author email, mirroring it onto the committer when linked.
    pub fn set_author_email(&mut self, email: impl Into<String>) {
        self.author.email = email.into();
        if self.committer_equals_author {
            self.committer.email.clone_from(&self.author.email);
        }
    }

    /// Sets the author date, mirroring it onto the committer when linked.
    pub fn set_author_date(&mut self, when: DateTime<FixedOffset>) {
        self.author.when = when;
        if self.committer_equals_author {
            self.committer.when = when;
        }
    }

    /// Sets the committer name.
    pub fn set_committer_name(&mut self, name: impl Into<String>) {
        self.committer.name = name.into();
        self.unlink_if_diverged();
    }

    /// Sets the committer email.
    pub fn set_committer_email(&mut self, email: impl Into<String>) {
        self.committer.email = email.into();
        self.unlink_if_diverged();
    }

    /// Sets the committer date.
    pub fn set_committer_date(&mut self, when: DateTime<FixedOffset>) {
        self.committer.when = when;
        self.unlink_if_diverged();
    }

    /// Links or unlinks the committer to the author.
    ///
    /// Linking copies all author fields onto the committer immediately.
    pub fn set_committer_equals_author(&mut self, linked: bool) {
        self.committer_equals_author = linked;
        if linked {
            self.committer = self.author.clone();
        }
    }

    /// Whether any editable field differs from the loaded commit.
    pub fn is_modified(&self) -> bool {
        self.message != self.original.message
            || self.author != self.original.author
            || self.committer != self.original.committer
    }

    /// Discards all edits.
    pub fn undo(&mut self) {
        self.message.clone_from(&self.original.message);
        self.author = self.original.author.clone();
        self.committer = self.original.committer.clone();
        self.committer_equals_author = self.author == self.committer;
    }

    /// Whether a freshly read commit still equals this record's original values.
    ///
    /// Edits made to the record are irrelevant here.
    pub fn matches_original(&self, live: &LiveCommit) -> bool {
        self.original == *live
    }

    /// Copies the editable fields of another record of the same commit.
    pub fn restore_from(&mut self, other: &Self) {
        debug_assert_eq!(self.hash(), other.hash());

        self.message.clone_from(&other.message);
        self.author = other.author.clone();
        self.committer = other.committer.clone();
        self.committer_equals_author = self.author == self.committer;
    }

    fn unlink_if_diverged(&mut self) {
        if self.committer_equals_author && self.committer != self.author {
            self.committer_equals_author = false;
        }
    }
}
