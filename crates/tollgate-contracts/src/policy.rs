//! Decisions, verdicts, and rule classification types.
//!
//! Every evaluation ends in a `Verdict`. Only `Allow` and `Deny` are
//! automated outcomes; `Ask` means "no automated decision, defer to a human"
//! and is the safe default whenever anything goes wrong.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// The outcome of evaluating one proposed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
    Ask,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
            Decision::Ask => "ask",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Decision::Allow),
            "deny" => Ok(Decision::Deny),
            "ask" => Ok(Decision::Ask),
            other => Err(GateError::Parse {
                reason: format!("unknown decision '{other}'"),
            }),
        }
    }
}

/// A decision plus the optional human-readable reason behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub decision: Decision,
    pub reason: Option<String>,
}

impl Verdict {
    /// The "no automated decision" sentinel: `(ask, None)`.
    pub fn ask() -> Self {
        Self {
            decision: Decision::Ask,
            reason: None,
        }
    }

    pub fn new(decision: Decision, reason: Option<String>) -> Self {
        Self { decision, reason }
    }

    /// True for `Allow` and `Deny`.
    pub fn is_automated(&self) -> bool {
        self.decision != Decision::Ask
    }
}

/// The action a rule prescribes when it matches.
///
/// Written in rule documents as `action: allow` or `action: deny`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
}

impl RuleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleAction::Allow => "allow",
            RuleAction::Deny => "deny",
        }
    }

    pub fn decision(self) -> Decision {
        match self {
            RuleAction::Allow => Decision::Allow,
            RuleAction::Deny => Decision::Deny,
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleAction {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(RuleAction::Allow),
            "deny" => Ok(RuleAction::Deny),
            other => Err(GateError::Parse {
                reason: format!("unknown rule action '{other}'"),
            }),
        }
    }
}

/// Priority class of a rule source.
///
/// Rules are loaded tier by tier in [`RuleTier::PRIORITY`] order, and the
/// first matching rule in that concatenated list wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleTier {
    ProjectLearned,
    ProjectBase,
    GlobalLearned,
    GlobalBase,
}

impl RuleTier {
    /// All tiers, highest priority first.
    pub const PRIORITY: [RuleTier; 4] = [
        RuleTier::ProjectLearned,
        RuleTier::ProjectBase,
        RuleTier::GlobalLearned,
        RuleTier::GlobalBase,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleTier::ProjectLearned => "project-learned",
            RuleTier::ProjectBase => "project-base",
            RuleTier::GlobalLearned => "global-learned",
            RuleTier::GlobalBase => "global-base",
        }
    }
}

impl fmt::Display for RuleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
