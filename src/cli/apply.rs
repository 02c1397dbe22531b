//! Apply command: imports an edits file and rewrites the history.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use super::formatting::describe_changes;
use super::prompt::{ask_lost_edit, confirm_rewrite, Prompter, TerminalPrompter};
use super::RepoArgs;
use crate::data::EditsFile;
use crate::git::{short_hash, RewriteOutcome, BACKUP_REF_PREFIX};
use crate::session::{is_diverged, Session};

/// Apply command options.
#[derive(Parser)]
pub struct ApplyCommand {
    #[command(flatten)]
    repo: RepoArgs,

    /// Edits YAML file, as written by `export`.
    #[arg(value_name = "FILE")]
    pub edits_file: PathBuf,

    /// Answers every prompt with its first choice.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl ApplyCommand {
    /// Executes the apply command.
    pub fn execute(self) -> Result<()> {
        let edits = EditsFile::load_from_file(&self.edits_file)?;
        let session = Session::open(&self.repo.repo)?;

        let mut prompter = TerminalPrompter::stdin(self.yes || crate::utils::assume_yes());
        apply_edits(session, &edits, &mut prompter)?;
        Ok(())
    }
}

/// How an apply run ended.
#[derive(Debug)]
pub enum ApplyStatus {
    /// A lost-edit prompt was cancelled; nothing was written.
    Aborted,
    /// The edits matched the repository already.
    NoChanges,
    /// The rewrite confirmation was declined.
    Cancelled,
    /// The history was rewritten.
    Applied(RewriteOutcome),
}

/// Imports `edits` into `session` and rewrites the repository after confirmation.
pub fn apply_edits(
    mut session: Session,
    edits: &EditsFile,
    prompter: &mut dyn Prompter,
) -> Result<ApplyStatus> {
    let summary = edits.apply_to(session.snapshot_mut(), |lost| ask_lost_edit(&mut *prompter, lost));
    info!(
        "Imported edits: {} applied, {} discarded",
        summary.applied, summary.discarded
    );
    if summary.aborted {
        println!("❌ Cancelled. No changes were applied.");
        return Ok(ApplyStatus::Aborted);
    }

    if !session.any_changes() {
        prompter.info("There are no pending changes to apply.");
        return Ok(ApplyStatus::NoChanges);
    }

    println!("\n📋 Pending changes:");
    for record in session.snapshot().modified() {
        for line in describe_changes(record) {
            println!("{line}");
        }
    }

    if !confirm_rewrite(prompter)? {
        println!("❌ Cancelled. No changes were applied.");
        return Ok(ApplyStatus::Cancelled);
    }

    let outcome = session.apply().map_err(|e| {
        if is_diverged(&e) {
            e.context("The repository changed since it was loaded; run the command again")
        } else {
            e
        }
    })?;

    println!(
        "✅ Rewrote {} commits and moved {} references.",
        outcome.rewritten.len(),
        outcome.updated_refs.len()
    );
    for (old, new) in sorted_pairs(&outcome) {
        println!("   {} → {}", short_hash(old), short_hash(new));
    }
    println!("   Backups of the old references are under {BACKUP_REF_PREFIX}.");

    Ok(ApplyStatus::Applied(outcome))
}

fn sorted_pairs(outcome: &RewriteOutcome) -> Vec<(&str, &str)> {
    let mut pairs: Vec<_> = outcome
        .rewritten
        .iter()
        .map(|(old, new)| (old.as_str(), new.as_str()))
        .collect();
    pairs.sort_unstable();
    pairs
}
