//! Terminal prompts.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{ensure, Result};
use tracing::warn;

use crate::git::{short_hash, LostEdit, LostEditDecision};

/// How a prompt is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Plain information.
    Info,
    /// Something may be lost.
    Warning,
    /// A decision is needed.
    Question,
}

/// Most choices a prompt may offer.
pub const MAX_CHOICES: usize = 3;

/// Asks the user to pick one of a few labeled choices.
pub trait Prompter {
    /// Shows `message` and returns the index of the chosen entry of `choices`.
    ///
    /// `choices` holds one to [`MAX_CHOICES`] labels, the last one cancelling.
    fn ask(&mut self, kind: PromptKind, message: &str, choices: &[&str]) -> Result<usize>;

    /// Shows a message that needs no answer.
    fn info(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Prompter reading answers from a line-based reader, normally stdin.
///
/// `reader` and `interactive` are injected so tests can drive prompts without
/// blocking on real stdin.
pub struct TerminalPrompter<R> {
    reader: R,
    interactive: bool,
    assume_yes: bool,
}

impl TerminalPrompter<io::StdinLock<'static>> {
    /// Prompter on the process stdin.
    pub fn stdin(assume_yes: bool) -> Self {
        let interactive = io::stdin().is_terminal();
        Self::new(io::stdin().lock(), interactive, assume_yes)
    }
}

impl<R: BufRead> TerminalPrompter<R> {
    /// Creates a prompter. With `assume_yes` every prompt takes its first choice.
    pub fn new(reader: R, interactive: bool, assume_yes: bool) -> Self {
        Self {
            reader,
            interactive,
            assume_yes,
        }
    }
}

impl<R: BufRead> Prompter for TerminalPrompter<R> {
    fn ask(&mut self, kind: PromptKind, message: &str, choices: &[&str]) -> Result<usize> {
        let icon = match kind {
            PromptKind::Info => "ℹ️ ",
            PromptKind::Warning => "⚠️ ",
            PromptKind::Question => "❓",
        };
        let (Some(first), Some(last)) = (choices.first(), choices.last()) else {
            anyhow::bail!("A prompt needs at least one choice");
        };
        ensure!(choices.len() <= MAX_CHOICES, "A prompt offers at most {MAX_CHOICES} choices");
        let cancel = choices.len() - 1;

        println!("\n{icon} {message}");
        if self.assume_yes {
            println!("→ {first}");
            return Ok(0);
        }
        if !self.interactive {
            eprintln!("warning: stdin is not interactive, choosing '{last}'");
            return Ok(cancel);
        }

        let menu = choices
            .iter()
            .enumerate()
            .map(|(i, choice)| format!("[{}] {choice}", i + 1))
            .collect::<Vec<_>>()
            .join("  ");

        loop {
            print!("{menu}: ");
            io::stdout().flush()?;

            let mut input = String::new();
            if self.reader.read_line(&mut input)? == 0 {
                eprintln!("warning: stdin closed, choosing '{last}'");
                return Ok(cancel);
            }

            if let Some(index) = parse_choice(input.trim(), choices) {
                return Ok(index);
            }
            println!("Invalid choice. Enter a number between 1 and {}.", choices.len());
        }
    }
}

/// Matches an answer against a number or a full label, ignoring case.
fn parse_choice(input: &str, choices: &[&str]) -> Option<usize> {
    if let Ok(number) = input.parse::<usize>() {
        return (1..=choices.len()).contains(&number).then(|| number - 1);
    }
    choices
        .iter()
        .position(|choice| choice.eq_ignore_ascii_case(input))
}

/// Asks whether edits to a commit missing from the history may be dropped.
///
/// A failing prompt counts as an abort.
pub fn ask_lost_edit(prompter: &mut dyn Prompter, lost: &LostEdit<'_>) -> LostEditDecision {
    let message = format!(
        "You have made changes to commit {} but the repository does not have this commit.\n\
         If you choose to proceed, your changes to this commit will be discarded.\n\n\
         Do you wish to proceed, discarding your change?",
        short_hash(lost.hash)
    );

    match prompter.ask(PromptKind::Warning, &message, &["Yes", "Yes to all", "Cancel"]) {
        Ok(0) => LostEditDecision::Discard,
        Ok(1) => LostEditDecision::DiscardAll,
        Ok(_) => LostEditDecision::Abort,
        Err(e) => {
            warn!("Prompt failed, keeping edits: {e}");
            LostEditDecision::Abort
        }
    }
}

/// Page explaining the consequences of rewriting published history.
pub const REWRITING_HISTORY_URL: &str = "http://stackoverflow.com/a/1491022/33080";

/// Asks for confirmation before rewriting. Returns whether to go ahead.
pub fn confirm_rewrite(prompter: &mut dyn Prompter) -> Result<bool> {
    let message = "Apply pending changes to this repository?\n\
                   Remember that changing history has consequences that need to be understood.\n\n\
                   WARNING: MAKE A BACKUP OF YOUR REPOSITORY.\n\
                   This rewrites the repository in place. Every commit from the oldest edited \
                   one onwards gets a new hash, and branches are moved to the new commits.";
    let choices = [
        "Continue at my own risk",
        "More about rewriting history",
        "Cancel",
    ];

    loop {
        match prompter.ask(PromptKind::Question, message, &choices)? {
            0 => return Ok(true),
            1 => prompter.info(&format!(
                "Rewriting commits that others have already fetched forces everyone to \
                 rebase onto the new history. See {REWRITING_HISTORY_URL}"
            )),
            _ => return Ok(false),
        }
    }
}
