//! Learned-rule persistence.
//!
//! `RuleWriter` appends accepted suggestions to the project or global
//! learned-rules document, in the same block grammar the parser reads.
//! Before writing, it parses the existing document and skips the write if a
//! rule for the same tool with the same pattern and path is already there.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use regex::Regex;
use tracing::{debug, info};

use tollgate_contracts::{
    error::{GateError, GateResult},
    learning::{Scope, Suggestion},
};

use crate::{
    parser::parse_document,
    rule::Rule,
    store::{learned_tier, MemoryBank},
};

/// Reason written when a suggestion carries none.
pub const DEFAULT_REASON: &str = "learned from approval history";

/// Appends learned rules to the memory bank.
#[derive(Debug, Clone)]
pub struct RuleWriter {
    bank: MemoryBank,
}

impl RuleWriter {
    pub fn new(bank: MemoryBank) -> Self {
        Self { bank }
    }

    /// The learned-rules document for `scope`.
    pub fn path_for(&self, scope: Scope) -> PathBuf {
        self.bank.learned_rules_path(scope)
    }

    /// True if the `scope` document already holds an equivalent rule.
    ///
    /// A missing or unreadable document holds nothing.
    pub fn contains(&self, suggestion: &Suggestion, scope: Scope) -> bool {
        std::fs::read_to_string(self.path_for(scope))
            .map(|content| {
                parse_document(&content, learned_tier(scope))
                    .iter()
                    .any(|rule| is_equivalent(rule, suggestion))
            })
            .unwrap_or(false)
    }

    /// Append `suggestion` to the `scope` document.
    ///
    /// Returns the new rule id, or `None` if an equivalent rule already
    /// exists. A missing document is created with a title. A suggestion
    /// whose tool or content pattern does not compile is rejected, since it
    /// could never match.
    pub fn save(&self, suggestion: &Suggestion, scope: Scope) -> GateResult<Option<String>> {
        check_pattern(&format!("^(?:{})$", suggestion.tool))?;
        if let Some(pattern) = &suggestion.pattern {
            check_pattern(pattern)?;
        }

        let path = self.path_for(scope);

        let mut content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => document_header(scope),
            Err(e) => return Err(GateError::io(&path, e)),
        };

        let existing = parse_document(&content, learned_tier(scope));
        if existing.iter().any(|rule| is_equivalent(rule, suggestion)) {
            debug!(
                tool = %suggestion.tool,
                scope = %scope,
                "equivalent learned rule already exists"
            );
            return Ok(None);
        }

        let now = Local::now();
        let rule_id = unique_id(
            &format!("learned-{}", now.format("%Y%m%d%H%M%S")),
            &existing,
        );

        if !content.ends_with('\n') {
            content.push('\n');
        }
        content.push('\n');
        content.push_str(&render_block(&rule_id, suggestion, now.date_naive()));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GateError::io(parent, e))?;
        }
        std::fs::write(&path, content).map_err(|e| GateError::io(&path, e))?;

        info!(
            rule_id = %rule_id,
            tool = %suggestion.tool,
            action = %suggestion.action,
            scope = %scope,
            "saved learned rule"
        );
        Ok(Some(rule_id))
    }
}

fn check_pattern(pattern: &str) -> GateResult<()> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| GateError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Render one learned-rule block, terminated by a newline.
pub fn render_block(rule_id: &str, suggestion: &Suggestion, learned_at: NaiveDate) -> String {
    let mut block = format!(
        "### {rule_id}\n- tool: {}\n  action: {}\n",
        single_line(&suggestion.tool),
        suggestion.action
    );
    if let Some(pattern) = &suggestion.pattern {
        block.push_str(&format!("  pattern: {}\n", single_line(pattern)));
    }
    if let Some(path) = &suggestion.path {
        block.push_str(&format!("  path: {}\n", single_line(path)));
    }

    let reason = single_line(&suggestion.reason);
    let reason = if reason.is_empty() { DEFAULT_REASON.to_string() } else { reason };
    block.push_str(&format!(
        "  reason: {reason}\n  confidence: {:.2}\n  learned_at: {}\n  based_on: approved {}, rejected {}\n",
        suggestion.confidence,
        learned_at.format("%Y-%m-%d"),
        suggestion.based_on.approved,
        suggestion.based_on.rejected,
    ));
    block
}

/// Same tool, same content pattern, same path wildcard.
fn is_equivalent(rule: &Rule, suggestion: &Suggestion) -> bool {
    rule.tool == suggestion.tool
        && rule.pattern == suggestion.pattern
        && rule.path == suggestion.path
}

fn unique_id(base: &str, existing: &[Rule]) -> String {
    let taken = |id: &str| existing.iter().any(|r| r.id == id);
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|id| !taken(id))
        .unwrap_or_else(|| base.to_string())
}

/// Values must stay on one line or they would end the block early.
fn single_line(s: &str) -> String {
    s.replace(['\n', '\r'], " ").trim().to_string()
}

fn document_header(scope: Scope) -> String {
    let title = match scope {
        Scope::Project => "Project learned rules",
        Scope::Global => "Global learned rules",
    };
    format!("# {title}\n\n## Learned rules\n")
}
