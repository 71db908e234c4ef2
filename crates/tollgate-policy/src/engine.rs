//! First-match rule evaluation.
//!
//! `evaluate` is the matcher: it walks an ordered rule list and returns the
//! verdict of the first rule whose matchers all pass, or `Verdict::ask()`
//! when none does. `TieredPolicyEngine` reloads the tiered rule list from
//! disk on every evaluation and implements the `PolicyEngine` trait from
//! tollgate-core, so learned rules take effect on the very next action.

use tracing::debug;

use tollgate_contracts::{action::Action, error::GateResult, policy::Verdict};
use tollgate_core::traits::PolicyEngine;

use crate::{rule::Rule, store::RuleStore};

/// Return the verdict of the first rule in `rules` that matches `action`.
///
/// If no rule matches, returns the sentinel `(ask, None)`.
pub fn evaluate(action: &Action, rules: &[Rule]) -> Verdict {
    for rule in rules {
        if !rule.matches(action) {
            continue;
        }

        debug!(
            rule_id = %rule.id,
            tier = %rule.tier,
            tool = %action.tool,
            action = %rule.action,
            "rule matched"
        );

        return Verdict::new(rule.action.decision(), rule.reason.clone());
    }

    debug!(tool = %action.tool, rules = rules.len(), "no rule matched; deferring");
    Verdict::ask()
}

/// A `PolicyEngine` over the tiered Markdown rule documents.
///
/// ```rust,ignore
/// use tollgate_policy::{MemoryBank, RuleStore, TieredPolicyEngine};
///
/// let bank = MemoryBank::from_dirs(&home, &project_dir);
/// let engine = TieredPolicyEngine::new(RuleStore::from_memory_bank(&bank));
/// ```
#[derive(Debug, Clone)]
pub struct TieredPolicyEngine {
    store: RuleStore,
}

impl TieredPolicyEngine {
    pub fn new(store: RuleStore) -> Self {
        Self { store }
    }
}

impl PolicyEngine for TieredPolicyEngine {
    /// Load the rule list and evaluate `action` against it.
    ///
    /// Unreadable sources are skipped by the store, so this never fails;
    /// the `Result` exists for the trait's other implementors.
    fn evaluate(&self, action: &Action) -> GateResult<Verdict> {
        let rules = self.store.load();
        Ok(evaluate(action, &rules))
    }
}
