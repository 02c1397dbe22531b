//! Export command: writes the current history metadata to an edits file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use super::RepoArgs;
use crate::data::EditsFile;
use crate::session::Session;

/// Export command options.
#[derive(Parser)]
pub struct ExportCommand {
    #[command(flatten)]
    repo: RepoArgs,

    /// File to write the edits YAML to.
    #[arg(value_name = "FILE")]
    pub output: PathBuf,
}

impl ExportCommand {
    /// Executes the export command.
    pub fn execute(self) -> Result<()> {
        let session = Session::open(&self.repo.repo)?;

        EditsFile::from_snapshot(session.snapshot()).save_to_file(&self.output)?;

        println!(
            "💾 Exported {} commits to {}",
            session.snapshot().len(),
            self.output.display()
        );
        Ok(())
    }
}
