//! The rule record and its match semantics.
//!
//! A `Rule` is parsed from a Markdown rule document (see `parser`) and tagged
//! with the tier of the document it came from. Each matcher a rule declares
//! narrows what it applies to; a matcher the rule omits imposes no
//! restriction on that dimension.

use std::path::Path;

use regex::Regex;
use tracing::debug;

use tollgate_contracts::{
    action::Action,
    learning::BasedOn,
    policy::{RuleAction, RuleTier},
};

/// A single rule loaded from a rule document.
///
/// Rules are immutable once loaded. The first rule in priority order whose
/// matchers all pass decides the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Identifier taken from the block's heading line.
    pub id: String,

    /// Regex full-matched against the tool name. Supports alternation,
    /// e.g. `Write|Edit`.
    pub tool: String,

    /// Regex searched (not full-matched) in the action's command text, or
    /// its content text when there is no command.
    pub pattern: Option<String>,

    /// Shell-style wildcard matched against the action's file path. A `**/`
    /// prefix matches the base name only, in any directory.
    pub path: Option<String>,

    pub action: RuleAction,

    pub reason: Option<String>,

    /// The source this rule was loaded from.
    pub tier: RuleTier,

    /// Set on learned rules.
    pub confidence: Option<f64>,

    /// Set on learned rules. `samples` is always empty.
    pub based_on: Option<BasedOn>,
}

impl Rule {
    /// Return true if every matcher this rule declares passes for `action`.
    ///
    /// Matching logic:
    /// - tool: `^(?:tool)$` against the tool name
    /// - pattern (if set): regex search against `ToolInput::primary_text`
    /// - path (if set): wildcard match against the file path; an action
    ///   without a file path never matches a path rule
    ///
    /// A pattern that fails to compile makes the rule a non-match; it never
    /// raises.
    pub fn matches(&self, action: &Action) -> bool {
        self.matches_tool(&action.tool)
            && self.matches_content(action.input.primary_text())
            && self.matches_path(action.input.path())
    }

    fn matches_tool(&self, tool: &str) -> bool {
        match Regex::new(&format!("^(?:{})$", self.tool)) {
            Ok(re) => re.is_match(tool),
            Err(e) => {
                debug!(rule_id = %self.id, error = %e, "invalid tool pattern, rule skipped");
                false
            }
        }
    }

    fn matches_content(&self, text: &str) -> bool {
        let Some(pattern) = &self.pattern else {
            return true;
        };
        match Regex::new(pattern) {
            Ok(re) => re.is_match(text),
            Err(e) => {
                debug!(rule_id = %self.id, error = %e, "invalid content pattern, rule skipped");
                false
            }
        }
    }

    fn matches_path(&self, file_path: Option<&str>) -> bool {
        let Some(pattern) = &self.path else {
            return true;
        };
        let Some(file_path) = file_path else {
            return false;
        };

        match pattern.strip_prefix("**/") {
            Some(name_pattern) => {
                let file_name = Path::new(file_path)
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                wildcard_match(name_pattern, &file_name)
            }
            None => wildcard_match(pattern, file_path),
        }
    }
}

/// Shell-style wildcard match. `*` also crosses `/`. An invalid wildcard
/// never matches.
pub fn wildcard_match(pattern: &str, candidate: &str) -> bool {
    match glob::Pattern::new(pattern) {
        Ok(p) => p.matches(candidate),
        Err(e) => {
            debug!(pattern = %pattern, error = %e, "invalid path wildcard");
            false
        }
    }
}
