//! Edits file: per-commit metadata edits exchanged as YAML.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::git::{
    short_hash, CommitRecord, LostEdit, LostEditDecision, LostEditGate, RepositorySnapshot,
    FULL_HASH_LEN,
};

/// Edits file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditsFile {
    /// Edits, one entry per commit.
    pub edits: Vec<CommitEdit>,
}

/// New values for one commit. Absent fields are left as they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEdit {
    /// Full 40-character SHA-1 commit hash.
    pub commit: String,
    /// New commit message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// New author fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<IdentityEdit>,
    /// New committer fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer: Option<IdentityEdit>,
    /// Whether the committer follows the author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committer_equals_author: Option<bool>,
}

/// New values for an author or committer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEdit {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Timestamp as `dd/mm/yyyy HH:MM:SS ±hh:mm`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::data::timestamp::serde_text::option"
    )]
    pub date: Option<DateTime<FixedOffset>>,
}

/// What [`EditsFile::apply_to`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Entries whose commit was found.
    pub applied: usize,
    /// Entries dropped because their commit is not in the snapshot.
    pub discarded: usize,
    /// Whether the import was aborted.
    pub aborted: bool,
}

impl EditsFile {
    /// Captures the current values of every record.
    pub fn from_snapshot(snapshot: &RepositorySnapshot) -> Self {
        Self {
            edits: snapshot.records().iter().map(CommitEdit::from_record).collect(),
        }
    }

    /// Loads edits from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read edits file: {}", path.as_ref().display()))?;

        let edits_file: Self =
            crate::data::from_yaml(&content).context("Failed to parse YAML edits file")?;

        edits_file.validate()?;

        Ok(edits_file)
    }

    /// Saves edits to a YAML file.
    ///
    /// Written with `serde_yaml` directly so messages keep their exact
    /// trailing newlines when read back.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize edits to YAML")?;

        fs::write(&path, yaml)
            .with_context(|| format!("Failed to write edits file: {}", path.as_ref().display()))
    }

    /// Validates every entry.
    pub fn validate(&self) -> Result<()> {
        for (i, edit) in self.edits.iter().enumerate() {
            edit.validate()
                .with_context(|| format!("Invalid edit at index {i}"))?;
        }

        Ok(())
    }

    /// Applies the edits to the matching records of `snapshot`.
    ///
    /// Entries naming a commit the snapshot does not hold go through `ask`,
    /// like lost edits during a reload. On abort the snapshot is left as it
    /// was before the call.
    pub fn apply_to<F>(&self, snapshot: &mut RepositorySnapshot, ask: F) -> ImportSummary
    where
        F: FnMut(&LostEdit<'_>) -> LostEditDecision,
    {
        let mut gate = LostEditGate::new(ask);
        let mut staged = snapshot.clone();
        let mut summary = ImportSummary::default();

        for edit in &self.edits {
            if let Some(record) = staged.find_mut(&edit.commit) {
                edit.apply(record);
                summary.applied += 1;
                continue;
            }

            debug!("Edited commit {} is not in the snapshot", short_hash(&edit.commit));
            if !gate.allow_discard(&LostEdit { hash: &edit.commit }) {
                return ImportSummary {
                    aborted: true,
                    ..summary
                };
            }
            summary.discarded += 1;
        }

        *snapshot = staged;
        summary
    }
}

impl CommitEdit {
    /// Captures every editable field of a record.
    pub fn from_record(record: &CommitRecord) -> Self {
        let linked = record.committer_equals_author();
        Self {
            commit: record.hash().to_string(),
            message: Some(record.message().to_string()),
            author: Some(IdentityEdit {
                name: Some(record.author().name.clone()),
                email: Some(record.author().email.clone()),
                date: Some(record.author().when),
            }),
            // a linked committer is implied by the author
            committer: (!linked).then(|| IdentityEdit {
                name: Some(record.committer().name.clone()),
                email: Some(record.committer().email.clone()),
                date: Some(record.committer().when),
            }),
            committer_equals_author: Some(linked),
        }
    }

    /// Validates the entry.
    pub fn validate(&self) -> Result<()> {
        if self.commit.len() != FULL_HASH_LEN {
            anyhow::bail!(
                "Commit hash must be exactly {FULL_HASH_LEN} characters long, got: {}",
                self.commit.len()
            );
        }

        if !self
            .commit
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            anyhow::bail!("Commit hash must contain only lowercase hexadecimal characters");
        }

        Ok(())
    }

    /// Writes the present fields through the record setters.
    ///
    /// Linking is applied first and the author before the committer, so
    /// a linked committer picks up the new author values.
    pub fn apply(&self, record: &mut CommitRecord) {
        if let Some(linked) = self.committer_equals_author {
            record.set_committer_equals_author(linked);
        }
        if let Some(message) = &self.message {
            record.set_message(message.clone());
        }
        if let Some(author) = &self.author {
            if let Some(name) = &author.name {
                record.set_author_name(name.clone());
            }
            if let Some(email) = &author.email {
                record.set_author_email(email.clone());
            }
            if let Some(date) = author.date {
                record.set_author_date(date);
            }
        }
        if let Some(committer) = &self.committer {
            if let Some(name) = &committer.name {
                record.set_committer_name(name.clone());
            }
            if let Some(email) = &committer.email {
                record.set_committer_email(email.clone());
            }
            if let Some(date) = committer.date {
                record.set_committer_date(date);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::git::record::tests::{live, when};
    use crate::git::{HistoryRepository, Identity, LiveCommit};
    use std::path::PathBuf;

    const H1: &str = "1111111111111111111111111111111111111111";
    const H2: &str = "2222222222222222222222222222222222222222";
    const H3: &str = "3333333333333333333333333333333333333333";

    struct Fixed(Vec<LiveCommit>);

    impl HistoryRepository for Fixed {
        fn commits(&self) -> Result<Vec<LiveCommit>> {
            Ok(self.0.clone())
        }
        fn references_with_prefix(&self, _prefix: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        fn delete_reference(&mut self, _name: &str) -> Result<()> {
            Ok(())
        }
        fn rewrite_history(
            &mut self,
            _hashes: &[String],
            _rewrite: &mut dyn FnMut(&LiveCommit) -> Option<crate::git::HeaderRewrite>,
        ) -> Result<crate::git::RewriteOutcome> {
            anyhow::bail!("read-only")
        }
    }

    fn snapshot() -> RepositorySnapshot {
        let split = LiveCommit {
            committer: Identity::new("Bob", "bob@example.com", when(-5, 2)),
            ..live(H1, "one\n")
        };
        let repo = Fixed(vec![live(H2, "two\n"), split]);
        RepositorySnapshot::from_repository(&repo, PathBuf::from("/repo")).unwrap()
    }

    #[test]
    fn parses_partial_entries() {
        let yaml = format!(
            r#"
edits:
  - commit: "{H2}"
    message: |
      Reworded subject

      Body line
    author:
      name: Grace Hopper
      date: "09/12/1906 10:00:00 -05:00"
  - commit: "{H1}"
    committer_equals_author: true
"#
        );

        let file: EditsFile = crate::data::from_yaml(&yaml).unwrap();
        file.validate().unwrap();

        assert_eq!(file.edits.len(), 2);
        assert_eq!(
            file.edits[0].message.as_deref(),
            Some("Reworded subject\n\nBody line\n")
        );
        let author = file.edits[0].author.as_ref().unwrap();
        assert_eq!(author.email, None);
        assert_eq!(author.date.unwrap().offset().local_minus_utc(), -5 * 3600);
        assert_eq!(file.edits[1].committer_equals_author, Some(true));
    }

    #[test]
    fn rejects_bad_dates() {
        let yaml = format!(
            r#"
edits:
  - commit: "{H2}"
    author:
      date: "1906-12-09 10:00:00"
"#
        );

        assert!(crate::data::from_yaml::<EditsFile>(&yaml).is_err());
    }

    #[test]
    fn rejects_bad_hashes() {
        let upper = "A".repeat(FULL_HASH_LEN);
        let non_hex = "g".repeat(FULL_HASH_LEN);
        for commit in ["12345", upper.as_str(), non_hex.as_str()] {
            let edit = CommitEdit {
                commit: commit.to_string(),
                message: None,
                author: None,
                committer: None,
                committer_equals_author: None,
            };
            assert!(edit.validate().is_err(), "accepted {commit}");
        }
    }

    #[test]
    fn export_then_import_is_a_no_op() {
        let mut snap = snapshot();
        let exported = EditsFile::from_snapshot(&snap);

        let summary = exported.apply_to(&mut snap, |_| panic!("all commits exist"));

        assert_eq!(summary.applied, 2);
        assert!(!snap.any_changes());
        assert!(!snap.find(H1).unwrap().committer_equals_author());
    }

    #[test]
    fn import_goes_through_setters() {
        let mut snap = snapshot();
        let file = EditsFile {
            edits: vec![CommitEdit {
                commit: H2.to_string(),
                message: None,
                author: Some(IdentityEdit {
                    name: Some("Grace".to_string()),
                    ..IdentityEdit::default()
                }),
                committer: None,
                committer_equals_author: None,
            }],
        };

        file.apply_to(&mut snap, |_| LostEditDecision::Abort);

        let record = snap.find(H2).unwrap();
        assert_eq!(record.author().name, "Grace");
        assert_eq!(record.committer().name, "Grace");
    }

    #[test]
    fn missing_commit_abort_leaves_snapshot_untouched() {
        let mut snap = snapshot();
        let file = EditsFile {
            edits: vec![
                CommitEdit {
                    message: Some("changed\n".to_string()),
                    ..CommitEdit::from_record(snap.find(H2).unwrap())
                },
                CommitEdit {
                    commit: H3.to_string(),
                    message: Some("gone\n".to_string()),
                    author: None,
                    committer: None,
                    committer_equals_author: None,
                },
            ],
        };

        let summary = file.apply_to(&mut snap, |_| LostEditDecision::Abort);

        assert!(summary.aborted);
        assert!(!snap.any_changes());

        let summary = file.apply_to(&mut snap, |_| LostEditDecision::DiscardAll);
        assert_eq!(summary.discarded, 1);
        assert_eq!(snap.find(H2).unwrap().message(), "changed\n");
    }

    #[test]
    fn save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("edits.yaml");
        let mut snap = snapshot();
        snap.find_mut(H2)
            .unwrap()
            .set_message("Subject\n\nMultiple\nlines\n");
        snap.find_mut(H1).unwrap().set_message("no trailing newline");

        let exported = EditsFile::from_snapshot(&snap);
        exported.save_to_file(&path).unwrap();
        let loaded = EditsFile::load_from_file(&path).unwrap();

        assert_eq!(loaded, exported);
    }
}
