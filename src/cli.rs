//! CLI interface for git-rehead.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

pub mod apply;
pub mod edit;
pub mod export;
pub(crate) mod formatting;
pub mod prompt;
pub mod view;

/// git-rehead: edits commit messages, authors and committers across a history.
#[derive(Parser)]
#[command(name = "git-rehead")]
#[command(
    about = "Edit commit messages, authors and committers across a Git history",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Repository selection shared by the commands.
#[derive(Args)]
pub struct RepoArgs {
    /// Path of the repository working tree or `.git` directory.
    #[arg(long, short = 'r', value_name = "PATH", default_value = ".")]
    pub repo: PathBuf,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Shows the commits reachable from HEAD with their metadata.
    View(view::ViewCommand),
    /// Writes the commit metadata to an edits file.
    Export(export::ExportCommand),
    /// Applies an edits file and rewrites the history.
    Apply(apply::ApplyCommand),
    /// Edits the commit metadata in an editor and rewrites the history.
    Edit(edit::EditCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::View(view_cmd) => view_cmd.execute(),
            Commands::Export(export_cmd) => export_cmd.execute(),
            Commands::Apply(apply_cmd) => apply_cmd.execute(),
            Commands::Edit(edit_cmd) => edit_cmd.execute(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn repo_defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["git-rehead", "export", "out.yaml"]).unwrap();
        let Commands::Export(export) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(export.output, PathBuf::from("out.yaml"));
    }

    #[test]
    fn apply_requires_a_file() {
        assert!(Cli::try_parse_from(["git-rehead", "apply"]).is_err());

        let cli =
            Cli::try_parse_from(["git-rehead", "apply", "--repo", "/tmp/r", "e.yaml", "--yes"])
                .unwrap();
        let Commands::Apply(apply) = cli.command else {
            panic!("expected apply");
        };
        assert!(apply.yes);
        assert_eq!(apply.edits_file, PathBuf::from("e.yaml"));
    }
}
