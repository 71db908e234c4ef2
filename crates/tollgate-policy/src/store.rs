//! Tiered rule loading.
//!
//! Rules come from four Markdown documents, loaded in strict priority order:
//!
//! 1. project learned rules (`.claude/memory-bank/learned-rules.md`)
//! 2. project base rules    (`.claude/memory-bank/rules.md`)
//! 3. global learned rules  (`~/.claude/memory-bank/learned-rules.md`)
//! 4. global base rules     (`~/.claude/memory-bank/rules.md`)
//!
//! Priority is purely the concatenation order; rules are never re-sorted
//! across tiers. A missing or unreadable document contributes no rules and
//! never prevents the others from loading.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use tollgate_contracts::{
    error::{GateError, GateResult},
    learning::Scope,
    policy::RuleTier,
};

use crate::{parser::parse_document, rule::Rule};

pub const RULES_FILE: &str = "rules.md";
pub const LEARNED_RULES_FILE: &str = "learned-rules.md";

/// On-disk layout of the global and project memory banks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBank {
    /// User-wide root, normally `~/.claude/memory-bank`.
    pub global_root: PathBuf,
    /// Per-project root, normally `<project>/.claude/memory-bank`.
    pub project_root: PathBuf,
}

impl MemoryBank {
    pub fn new(global_root: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            global_root: global_root.into(),
            project_root: project_root.into(),
        }
    }

    /// The standard layout under a home directory and a project directory.
    pub fn from_dirs(home: &Path, project_dir: &Path) -> Self {
        Self::new(
            home.join(".claude").join("memory-bank"),
            project_dir.join(".claude").join("memory-bank"),
        )
    }

    /// The rule document backing `tier`.
    pub fn rules_path(&self, tier: RuleTier) -> PathBuf {
        match tier {
            RuleTier::ProjectLearned => self.project_root.join(LEARNED_RULES_FILE),
            RuleTier::ProjectBase => self.project_root.join(RULES_FILE),
            RuleTier::GlobalLearned => self.global_root.join(LEARNED_RULES_FILE),
            RuleTier::GlobalBase => self.global_root.join(RULES_FILE),
        }
    }

    /// The learned-rules document for `scope`.
    pub fn learned_rules_path(&self, scope: Scope) -> PathBuf {
        self.rules_path(learned_tier(scope))
    }

    /// Directory of the day-partitioned feedback log.
    pub fn feedback_dir(&self) -> PathBuf {
        self.project_root.join("feedback")
    }

    /// Directory of session summaries.
    pub fn sessions_dir(&self) -> PathBuf {
        self.project_root.join("sessions")
    }
}

/// The learned tier a scope writes to.
pub fn learned_tier(scope: Scope) -> RuleTier {
    match scope {
        Scope::Project => RuleTier::ProjectLearned,
        Scope::Global => RuleTier::GlobalLearned,
    }
}

/// One rule document and the tier its rules receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSource {
    pub tier: RuleTier,
    pub path: PathBuf,
}

/// Loads the ordered rule list from its sources.
#[derive(Debug, Clone)]
pub struct RuleStore {
    sources: Vec<RuleSource>,
}

impl RuleStore {
    /// A store over explicit sources, listed highest priority first.
    pub fn new(sources: Vec<RuleSource>) -> Self {
        Self { sources }
    }

    /// The four standard sources of `bank`, in tier priority order.
    pub fn from_memory_bank(bank: &MemoryBank) -> Self {
        Self::new(
            RuleTier::PRIORITY
                .iter()
                .map(|&tier| RuleSource {
                    tier,
                    path: bank.rules_path(tier),
                })
                .collect(),
        )
    }

    pub fn sources(&self) -> &[RuleSource] {
        &self.sources
    }

    /// Load every source and concatenate the rules in source order.
    ///
    /// Never fails: a source that cannot be read is logged and skipped.
    pub fn load(&self) -> Vec<Rule> {
        let mut rules = Vec::new();
        for source in &self.sources {
            match load_source(source) {
                Ok(parsed) => {
                    debug!(
                        tier = %source.tier,
                        path = %source.path.display(),
                        count = parsed.len(),
                        "loaded rules"
                    );
                    rules.extend(parsed);
                }
                Err(e) => {
                    warn!(tier = %source.tier, error = %e, "skipping unreadable rule source");
                }
            }
        }
        rules
    }
}

/// Load one source. A missing document yields no rules.
pub fn load_source(source: &RuleSource) -> GateResult<Vec<Rule>> {
    match std::fs::read_to_string(&source.path) {
        Ok(content) => Ok(parse_document(&content, source.tier)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(GateError::io(&source.path, e)),
    }
}
