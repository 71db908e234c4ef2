//! Pattern mining over resolved ask decisions.
//!
//! Each resolved ask entry is mapped to a [`PatternKey`]. Entries sharing a
//! key are tallied, and a key whose tally is large and lopsided enough
//! becomes a [`Suggestion`].

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use tollgate_contracts::{
    action::SimplifiedInput,
    feedback::{Executed, FeedbackEntry},
    learning::{BasedOn, Suggestion},
    policy::RuleAction,
};

/// The shell-command tool.
pub const SHELL_TOOL: &str = "Bash";

/// Tools grouped by the extension of the file they touch.
pub const FILE_TOOLS: [&str; 3] = ["Write", "Edit", "Read"];

/// First tokens whose second token is part of the grouping key.
pub const PACKAGE_MANAGERS: [&str; 4] = ["npm", "git", "yarn", "pnpm"];

/// Path sentinel shared by files without an extension.
pub const NO_EXTENSION: &str = "no_ext";

/// Samples kept per group.
pub const MAX_SAMPLES: usize = 5;

/// How the entries of one tool are grouped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Leading one or two tokens of a shell command. Empty for an empty
    /// command.
    CommandPrefix(String),
    /// File extension with its leading dot, `None` when the file has none.
    FileExt(Option<String>),
    /// Everything else: one group per tool.
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub tool: String,
    pub kind: KeyKind,
}

impl PatternKey {
    /// Derive the grouping key for `tool` invoked with `input`.
    pub fn derive(tool: &str, input: &SimplifiedInput) -> Self {
        let kind = if tool == SHELL_TOOL {
            KeyKind::CommandPrefix(command_prefix(input.command.as_deref().unwrap_or("")))
        } else if FILE_TOOLS.contains(&tool) {
            KeyKind::FileExt(input.file_path.as_deref().and_then(extension))
        } else {
            KeyKind::General
        };
        Self {
            tool: tool.to_string(),
            kind,
        }
    }

    /// Pattern and path a rule for this key would carry.
    ///
    /// An empty command maps to a pattern matching blank command text. Files
    /// without an extension share the `no_ext` path sentinel.
    fn matchers(&self) -> (Option<String>, Option<String>) {
        match &self.kind {
            KeyKind::CommandPrefix(prefix) if prefix.is_empty() => (Some(r"^\s*$".to_string()), None),
            KeyKind::CommandPrefix(prefix) => (Some(format!("^{}", regex::escape(prefix))), None),
            KeyKind::FileExt(None) => (None, Some(format!("**/*{NO_EXTENSION}"))),
            KeyKind::FileExt(Some(ext)) => (None, Some(format!("**/*{ext}"))),
            KeyKind::General => (None, None),
        }
    }

    fn reason(&self, action: RuleAction) -> String {
        let approves = action == RuleAction::Allow;
        match &self.kind {
            KeyKind::CommandPrefix(prefix) if prefix.is_empty() => format!(
                "user consistently {} empty commands",
                if approves { "approves" } else { "rejects" }
            ),
            KeyKind::CommandPrefix(prefix) => format!(
                "user consistently {} `{prefix}` commands",
                if approves { "approves" } else { "rejects" }
            ),
            KeyKind::FileExt(ext) => {
                let ext = ext.as_deref().unwrap_or("extensionless");
                if approves {
                    format!("user consistently approves {ext} files")
                } else {
                    format!("user is cautious with {ext} files")
                }
            }
            KeyKind::General => format!(
                "user consistently {} {} calls",
                if approves { "approves" } else { "rejects" },
                self.tool
            ),
        }
    }
}

/// Leading token of `command`, or the leading two when the first is a
/// package manager.
pub fn command_prefix(command: &str) -> String {
    let mut tokens = command.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(first), Some(second)) if PACKAGE_MANAGERS.contains(&first) => format!("{first} {second}"),
        (Some(first), _) => first.to_string(),
        (None, _) => String::new(),
    }
}

fn extension(file_path: &str) -> Option<String> {
    Path::new(file_path)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

#[derive(Debug, Default)]
struct Tally {
    approved: u32,
    rejected: u32,
    samples: Vec<SimplifiedInput>,
}

/// Mine `entries` for suggestions.
///
/// Only resolved ask entries count. A group yields a suggestion when it has
/// at least `threshold` entries and its majority side reaches
/// `min_confidence`. Suggestions come out in the order their keys were first
/// seen.
pub fn scan(entries: &[FeedbackEntry], threshold: u32, min_confidence: f64) -> Vec<Suggestion> {
    let mut order: Vec<PatternKey> = Vec::new();
    let mut tallies: HashMap<PatternKey, Tally> = HashMap::new();

    for entry in entries.iter().filter(|e| e.is_resolved_ask()) {
        let approved = entry.executed == Executed::Yes;
        let key = PatternKey::derive(&entry.tool, &entry.input);
        let tally = tallies.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Tally::default()
        });
        if approved {
            tally.approved += 1;
        } else {
            tally.rejected += 1;
        }
        if tally.samples.len() < MAX_SAMPLES {
            tally.samples.push(entry.input.clone());
        }
    }

    let mut suggestions = Vec::new();
    for key in order {
        let Some(tally) = tallies.remove(&key) else {
            continue;
        };
        if let Some(suggestion) = suggest(&key, tally, threshold, min_confidence) {
            suggestions.push(suggestion);
        }
    }
    debug!(count = suggestions.len(), "pattern scan finished");
    suggestions
}

fn suggest(key: &PatternKey, tally: Tally, threshold: u32, min_confidence: f64) -> Option<Suggestion> {
    let total = tally.approved + tally.rejected;
    if total == 0 || total < threshold {
        return None;
    }

    let (action, majority) = if tally.approved > tally.rejected {
        (RuleAction::Allow, tally.approved)
    } else {
        (RuleAction::Deny, tally.rejected)
    };
    let confidence = f64::from(majority) / f64::from(total);
    if confidence < min_confidence {
        return None;
    }

    let (pattern, path) = key.matchers();
    Some(Suggestion {
        tool: key.tool.clone(),
        action,
        confidence: (confidence * 100.0).round() / 100.0,
        based_on: BasedOn {
            approved: tally.approved,
            rejected: tally.rejected,
            samples: tally.samples,
        },
        pattern,
        path,
        reason: key.reason(action),
    })
}
