//! Edit command: opens the history metadata in an editor and applies the result.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use clap::Parser;

use super::apply::apply_edits;
use super::formatting::parse_editor_command;
use super::prompt::TerminalPrompter;
use super::RepoArgs;
use crate::data::EditsFile;
use crate::session::Session;
use crate::utils::settings::EDITOR_VARS;

/// Edit command options.
#[derive(Parser)]
pub struct EditCommand {
    #[command(flatten)]
    repo: RepoArgs,

    /// Answers every prompt with its first choice.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl EditCommand {
    /// Executes the edit command.
    pub fn execute(self) -> Result<()> {
        let session = Session::open(&self.repo.repo)?;
        if session.snapshot().is_empty() {
            println!("The repository has no commits to edit.");
            return Ok(());
        }

        let editor = crate::utils::editor().with_context(|| {
            format!("No editor configured. Set one of {}", EDITOR_VARS.join(", "))
        })?;

        let edits_file = tempfile::Builder::new()
            .prefix("git-rehead-")
            .suffix(".yaml")
            .tempfile()
            .context("Failed to create temporary edits file")?;
        EditsFile::from_snapshot(session.snapshot()).save_to_file(edits_file.path())?;

        run_editor(&editor, edits_file.path())?;

        let edits = EditsFile::load_from_file(edits_file.path())?;
        let mut prompter = TerminalPrompter::stdin(self.yes || crate::utils::assume_yes());
        apply_edits(session, &edits, &mut prompter)?;
        Ok(())
    }
}

/// Runs `editor` on `file` and waits for it to exit.
fn run_editor(editor: &str, file: &Path) -> Result<()> {
    println!("📝 Opening edits file in editor: {editor}");

    let (editor_cmd, args) = parse_editor_command(editor);
    let status = Command::new(editor_cmd)
        .args(args)
        .arg(file)
        .status()
        .with_context(|| format!("Failed to execute editor '{editor}'"))?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status: {:?}", status.code());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn editor_failure_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("edits.yaml");

        assert!(run_editor("true", &file).is_ok());
        assert!(run_editor("false", &file).is_err());
        assert!(run_editor("git-rehead-no-such-editor", &file).is_err());
    }
}
