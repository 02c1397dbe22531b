//! Display helpers shared by the commands.

use crate::data::format_timestamp;
use crate::git::{short_hash, CommitRecord, Identity};

/// Splits an editor command string into the executable and its arguments.
///
/// Handles editors specified with arguments, e.g. `"code --wait"` becomes
/// `("code", vec!["--wait"])`.
pub(crate) fn parse_editor_command(editor: &str) -> (&str, Vec<&str>) {
    let mut parts = editor.split_whitespace();
    let cmd = parts.next().unwrap_or(editor);
    let args: Vec<&str> = parts.collect();
    (cmd, args)
}

/// First line of a commit message.
pub(crate) fn subject(message: &str) -> &str {
    message.lines().next().unwrap_or_default()
}

fn describe_identity(role: &str, before: &Identity, after: &Identity, lines: &mut Vec<String>) {
    if before.name != after.name {
        lines.push(format!("   {role} name: {:?} → {:?}", before.name, after.name));
    }
    if before.email != after.email {
        lines.push(format!("   {role} email: {} → {}", before.email, after.email));
    }
    let (from, to) = (format_timestamp(&before.when), format_timestamp(&after.when));
    if from != to {
        lines.push(format!("   {role} date: {from} → {to}"));
    }
}

/// Lists what changed in a record, one line per field, under a header line.
pub(crate) fn describe_changes(record: &CommitRecord) -> Vec<String> {
    let original = record.original();
    let mut lines = vec![format!(
        "📝 {} {}",
        short_hash(record.hash()),
        subject(&original.message)
    )];

    if record.message() != original.message {
        lines.push(format!("   message: {:?}", subject(record.message())));
    }
    describe_identity("author", &original.author, record.author(), &mut lines);
    describe_identity("committer", &original.committer, record.committer(), &mut lines);

    lines
}
