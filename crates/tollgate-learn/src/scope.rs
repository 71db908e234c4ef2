//! Project-vs-global scoping of learned rules.
//!
//! An ordered decision list; the first matching step decides. Anything the
//! list does not recognize stays in the project.

use tollgate_contracts::{
    learning::{Scope, Suggestion},
    policy::RuleAction,
};

use crate::miner::SHELL_TOOL;

/// Destructive command fragments. A deny rule containing one applies
/// everywhere.
pub const DANGEROUS_FRAGMENTS: [&str; 6] = ["rm -rf", "sudo rm", "chmod 777", "> /dev/", "mkfs", "dd if="];

pub const READ_ONLY_TOOLS: [&str; 5] = ["Read", "Glob", "Grep", "WebSearch", "WebFetch"];

pub const GENERIC_TOOLS: [&str; 3] = ["TodoWrite", "AskUserQuestion", "Task"];

/// Tokens that tie a shell rule to a project's toolchain.
pub const PACKAGE_MANAGER_TOKENS: [&str; 8] = ["npm", "yarn", "pnpm", "pip", "cargo", "go ", "bun", "poetry"];

pub const FILE_MUTATION_TOOLS: [&str; 3] = ["Write", "Edit", "NotebookEdit"];

/// Decide where `suggestion` belongs, with a human-readable reason.
pub fn classify(suggestion: &Suggestion) -> (Scope, String) {
    let tool = suggestion.tool.as_str();
    let pattern = suggestion.pattern.as_deref().unwrap_or("");

    if suggestion.action == RuleAction::Deny {
        if let Some(fragment) = find_fragment(pattern, &DANGEROUS_FRAGMENTS) {
            return (
                Scope::Global,
                format!("dangerous command '{fragment}' should be denied everywhere"),
            );
        }
    }

    if READ_ONLY_TOOLS.contains(&tool) {
        return (
            Scope::Global,
            format!("{tool} is read-only and usually behaves the same in every project"),
        );
    }

    if GENERIC_TOOLS.contains(&tool) {
        return (Scope::Global, format!("{tool} is a generic assistant tool"));
    }

    if tool == SHELL_TOOL {
        if let Some(token) = find_fragment(pattern, &PACKAGE_MANAGER_TOKENS) {
            return (
                Scope::Project,
                format!("package manager '{}' depends on the project's stack", token.trim()),
            );
        }
    }

    if suggestion.path.is_some() {
        return (Scope::Project, "path rules depend on the project layout".to_string());
    }

    if FILE_MUTATION_TOOLS.contains(&tool) {
        return (Scope::Project, "edits depend on the project's files".to_string());
    }

    (Scope::Project, "kept in the project by default".to_string())
}

/// First of `fragments` found in `pattern`, checked against both the raw
/// pattern and its regex-unescaped form (mined prefixes are escaped, so
/// `rm -rf` is stored as `rm \-rf`).
fn find_fragment<'a>(pattern: &str, fragments: &[&'a str]) -> Option<&'a str> {
    if pattern.is_empty() {
        return None;
    }
    let unescaped = pattern.replace('\\', "");
    fragments
        .iter()
        .copied()
        .find(|f| pattern.contains(f) || unescaped.contains(f))
}
