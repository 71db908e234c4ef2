//! Proposed tool invocations and their bounded-size projection.
//!
//! An `Action` is what the host asks tollgate to rule on: a tool name plus
//! the structured input the agent wants to pass to it. `SimplifiedInput` is
//! the bounded projection of that input kept in the feedback log.

use serde::{Deserialize, Serialize};

/// Maximum number of characters of a shell command kept in the feedback log.
pub const COMMAND_LIMIT: usize = 500;

/// Number of characters of file content kept as a preview.
pub const CONTENT_PREVIEW_LIMIT: usize = 100;

/// Maximum number of characters of a search query kept in the feedback log.
pub const QUERY_LIMIT: usize = 200;

/// The structured input of a proposed tool call.
///
/// Only the fields tollgate understands are captured; anything else the host
/// sends (todo lists, edit hunks, …) is ignored during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInput {
    /// Shell command text (shell-command tools).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Full file content (file-writing tools).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Target file path (file tools).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Search pattern (glob/grep style tools).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Free-text query (web search style tools).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl ToolInput {
    /// Input carrying only a shell command.
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::default()
        }
    }

    /// Input carrying only a file path.
    pub fn file(file_path: impl Into<String>) -> Self {
        Self {
            file_path: Some(file_path.into()),
            ..Self::default()
        }
    }

    /// The text a rule's content pattern is searched against: the command if
    /// present and non-empty, else the content, else the empty string.
    pub fn primary_text(&self) -> &str {
        [self.command.as_deref(), self.content.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }

    /// The file path, if present and non-empty.
    pub fn path(&self) -> Option<&str> {
        self.file_path.as_deref().filter(|p| !p.is_empty())
    }
}

/// A proposed tool invocation awaiting a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Tool name as reported by the host, e.g. `"Bash"` or `"Write"`.
    pub tool: String,
    /// The structured input the agent wants to pass to the tool.
    pub input: ToolInput,
}

impl Action {
    pub fn new(tool: impl Into<String>, input: ToolInput) -> Self {
        Self {
            tool: tool.into(),
            input,
        }
    }
}

/// The bounded-size projection of a `ToolInput` stored in feedback records.
///
/// Field names match the on-disk JSON Lines format, so `content` appears
/// as `content_preview`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl SimplifiedInput {
    /// Project `input` down to the size limits used by the feedback log.
    ///
    /// - `command` is truncated to [`COMMAND_LIMIT`] characters
    /// - `content` becomes a [`CONTENT_PREVIEW_LIMIT`]-character preview
    ///   followed by `...`
    /// - `query` is truncated to [`QUERY_LIMIT`] characters
    /// - `file_path` and `pattern` are kept verbatim
    pub fn from_input(input: &ToolInput) -> Self {
        Self {
            command: input.command.as_deref().map(|c| truncate_chars(c, COMMAND_LIMIT)),
            file_path: input.file_path.clone(),
            content_preview: input
                .content
                .as_deref()
                .map(|c| format!("{}...", truncate_chars(c, CONTENT_PREVIEW_LIMIT))),
            pattern: input.pattern.clone(),
            query: input.query.as_deref().map(|q| truncate_chars(q, QUERY_LIMIT)),
        }
    }
}

/// Keep at most `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
