//! View command: prints the commit history as YAML.

use anyhow::{Context, Result};
use clap::Parser;

use super::RepoArgs;
use crate::data::{to_yaml, SnapshotView};
use crate::git::GitRepository;
use crate::session::Session;

/// View command options.
#[derive(Parser)]
pub struct ViewCommand {
    #[command(flatten)]
    repo: RepoArgs,
}

impl ViewCommand {
    /// Executes the view command.
    pub fn execute(self) -> Result<()> {
        let session = Session::open(&self.repo.repo)?;
        let branch = GitRepository::open_at(session.repo_path())?.current_branch();

        let view = SnapshotView::new(session.snapshot(), branch);
        let yaml = to_yaml(&view).context("Failed to serialize repository view")?;
        println!("{yaml}");

        Ok(())
    }
}
