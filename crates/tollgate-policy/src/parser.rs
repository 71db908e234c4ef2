//! Markdown rule-document parser.
//!
//! A rule document holds one or more blocks of this shape:
//!
//! ```text
//! ### allow-npm-test
//! - tool: Bash
//!   action: allow
//!   pattern: ^npm test
//!   reason: test runs are safe
//! ```
//!
//! The heading supplies the rule id. The block starts at the first
//! `tool:` line under the heading and runs to the next blank line. Leading
//! indentation and list markers are ignored, unknown keys are ignored, and a
//! block that does not make a valid rule is skipped without affecting the
//! rest of the document.
//!
//! Parsing is two-staged: `scan_blocks` turns the text into tagged lines and
//! collects key/value blocks, then `parse_document` converts each block into
//! a typed `Rule`.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use tollgate_contracts::{
    error::{GateError, GateResult},
    learning::BasedOn,
    policy::{RuleAction, RuleTier},
};

use crate::rule::Rule;

/// Id used when a block has no heading above it.
pub const UNNAMED_RULE_ID: &str = "unknown";

/// One line of a rule document, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// `#`-prefixed heading; carries the first word of the heading text.
    Heading(&'a str),
    /// `key: value` with both sides non-empty after trimming.
    Field(&'a str, &'a str),
    Blank,
    /// Anything else (prose, a key with no value).
    Text,
}

/// Classify a single line.
pub fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if line.starts_with('#') {
        let id = line
            .trim_start_matches('#')
            .split_whitespace()
            .next()
            .unwrap_or(UNNAMED_RULE_ID);
        return Line::Heading(id);
    }

    let stripped = line.trim_start_matches(|c: char| c == '-' || c.is_whitespace());
    match stripped.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Line::Field(key.trim(), value.trim())
        }
        _ => Line::Text,
    }
}

/// A raw rule block: the heading id and its key/value pairs in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBlock {
    pub id: String,
    pub fields: Vec<(String, String)>,
}

impl RuleBlock {
    /// The last value given for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Collect every candidate block in `content`.
///
/// Only the first `tool:`-initiated block under each heading is collected;
/// text after that block's terminating blank line is ignored until the next
/// heading.
pub fn scan_blocks(content: &str) -> Vec<RuleBlock> {
    let mut blocks = Vec::new();
    let mut id = UNNAMED_RULE_ID.to_string();
    let mut current: Option<Vec<(String, String)>> = None;
    let mut section_done = false;

    for line in content.lines() {
        match classify(line) {
            Line::Heading(heading) => {
                if let Some(fields) = current.take() {
                    blocks.push(RuleBlock { id: id.clone(), fields });
                }
                id = heading.to_string();
                section_done = false;
            }
            Line::Blank => {
                if let Some(fields) = current.take() {
                    blocks.push(RuleBlock { id: id.clone(), fields });
                    section_done = true;
                }
            }
            Line::Field(key, value) => match current.as_mut() {
                Some(fields) => fields.push((key.to_string(), value.to_string())),
                None if key == "tool" && !section_done => {
                    current = Some(vec![(key.to_string(), value.to_string())]);
                }
                None => {}
            },
            Line::Text => {}
        }
    }

    if let Some(fields) = current {
        blocks.push(RuleBlock { id, fields });
    }

    blocks
}

/// Parse every valid rule in `content`, tagging each with `tier`.
///
/// Invalid blocks are logged at debug level and skipped.
pub fn parse_document(content: &str, tier: RuleTier) -> Vec<Rule> {
    scan_blocks(content)
        .into_iter()
        .filter_map(|block| match rule_from_block(&block, tier) {
            Ok(rule) => Some(rule),
            Err(e) => {
                debug!(rule_id = %block.id, tier = %tier, error = %e, "skipping rule block");
                None
            }
        })
        .collect()
}

/// Convert one block into a typed `Rule`.
///
/// `tool` and a valid `action` are required. `path` values may be quoted;
/// the quotes are stripped. `confidence` and `based_on` are kept only when
/// they parse.
pub fn rule_from_block(block: &RuleBlock, tier: RuleTier) -> GateResult<Rule> {
    let tool = block.get("tool").ok_or_else(|| GateError::Parse {
        reason: format!("rule '{}' has no tool", block.id),
    })?;

    let action: RuleAction = block
        .get("action")
        .ok_or_else(|| GateError::Parse {
            reason: format!("rule '{}' has no action", block.id),
        })?
        .parse()?;

    let path = block
        .get("path")
        .map(|p| p.trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|p| !p.is_empty());

    Ok(Rule {
        id: block.id.clone(),
        tool: tool.to_string(),
        pattern: block.get("pattern").map(str::to_string),
        path,
        action,
        reason: block.get("reason").map(str::to_string),
        tier,
        confidence: block.get("confidence").and_then(|c| c.parse().ok()),
        based_on: block.get("based_on").and_then(parse_based_on),
    })
}

/// Parse the `based_on: approved 4, rejected 1` line of a learned rule.
fn parse_based_on(value: &str) -> Option<BasedOn> {
    static BASED_ON: OnceLock<Regex> = OnceLock::new();
    let re = BASED_ON.get_or_init(|| {
        Regex::new(r"approved\s+(\d+)\D+rejected\s+(\d+)").expect("static regex is valid")
    });
    let caps = re.captures(value)?;
    Some(BasedOn {
        approved: caps[1].parse().ok()?,
        rejected: caps[2].parse().ok()?,
        samples: Vec::new(),
    })
}
