//! Rule suggestions mined from feedback history, and their scoping.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{action::SimplifiedInput, policy::RuleAction};

/// Approval statistics behind a suggestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasedOn {
    pub approved: u32,
    pub rejected: u32,
    /// Up to five raw input snapshots from the grouped entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<SimplifiedInput>,
}

impl BasedOn {
    pub fn total(&self) -> u32 {
        self.approved + self.rejected
    }
}

/// A candidate rule derived from historical outcomes, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub tool: String,
    pub action: RuleAction,
    /// Majority-side ratio, rounded to two decimals.
    pub confidence: f64,
    pub based_on: BasedOn,
    /// Content regex, set for command-prefix groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Path wildcard, set for file-extension groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub reason: String,
}

impl Suggestion {
    /// True if `other` describes the same rule: same tool, action, pattern
    /// and path. Statistics and wording are ignored.
    pub fn same_rule(&self, other: &Suggestion) -> bool {
        self.tool == other.tool
            && self.action == other.action
            && self.pattern == other.pattern
            && self.path == other.path
    }
}

/// Where a learned rule is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The current project's learned-rules document.
    Project,
    /// The user-wide learned-rules document (after confirmation).
    Global,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Project => f.write_str("project"),
            Scope::Global => f.write_str("global"),
        }
    }
}

/// A globally-scoped suggestion waiting for the user's confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingGlobalRule {
    pub id: String,
    pub rule: Suggestion,
    /// Why the scope classifier considered this rule global.
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl PendingGlobalRule {
    /// Wrap `rule` in a new queue entry with a fresh, unique id.
    pub fn new(rule: Suggestion, reason: impl Into<String>) -> Self {
        Self {
            id: format!("pending-{}", uuid::Uuid::new_v4().simple()),
            rule,
            reason: reason.into(),
            created_at: Utc::now(),
        }
    }
}
