//! The tollgate decision gate: one synchronous evaluation pass.
//!
//! The gate enforces the pass ordering:
//!
//!   Action → Policy → [Advisor, only on ask] → Feedback record → Verdict
//!
//! Nothing in the pass is fatal. A failing policy engine degrades to `ask`,
//! and a failing feedback write is logged and otherwise ignored, so a
//! storage hiccup never blocks or flips a decision.

use tracing::{debug, info, warn};

use tollgate_contracts::{
    action::Action,
    feedback::{Executed, FeedbackEntry},
    policy::Verdict,
};

use crate::{
    advisor::NoopAdvisor,
    traits::{Advisor, FeedbackStore, PolicyEngine},
};

/// One decision request from the host.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    /// Correlation id used later to report the outcome.
    pub id: String,
    pub session_id: String,
    pub action: Action,
}

/// The central gate that rules on proposed actions.
///
/// Construct one per invocation. The gate owns its collaborators and
/// applies the pass ordering on every call to `decide()`.
pub struct Gate {
    policy: Box<dyn PolicyEngine>,
    feedback: Box<dyn FeedbackStore>,
    advisor: Box<dyn Advisor>,
}

impl Gate {
    /// Create a gate with the no-op advisor.
    pub fn new(policy: Box<dyn PolicyEngine>, feedback: Box<dyn FeedbackStore>) -> Self {
        Self {
            policy,
            feedback,
            advisor: Box::new(NoopAdvisor),
        }
    }

    /// Replace the advisor consulted when no rule matches.
    pub fn with_advisor(mut self, advisor: Box<dyn Advisor>) -> Self {
        self.advisor = advisor;
        self
    }

    /// Rule on one proposed action and record the decision.
    ///
    /// # Pass
    ///
    /// 1. `policy.evaluate()`; an error is logged and treated as `ask`
    /// 2. If the result is `ask`, consult the advisor
    /// 3. Append a feedback entry with `executed = unknown`; a write error
    ///    is logged and does not change the verdict
    /// 4. Return the verdict
    pub fn decide(&self, request: &DecisionRequest) -> Verdict {
        let action = &request.action;

        debug!(
            id = %request.id,
            tool = %action.tool,
            "evaluating action"
        );

        // ── Step 1: Rules ────────────────────────────────────────────────────
        let mut verdict = match self.policy.evaluate(action) {
            Ok(v) => v,
            Err(e) => {
                warn!(tool = %action.tool, error = %e, "policy evaluation failed, deferring");
                Verdict::ask()
            }
        };

        // ── Step 2: Advisor fallback ─────────────────────────────────────────
        if !verdict.is_automated() {
            let advice = self.advisor.decide(action);
            if advice.is_automated() {
                debug!(tool = %action.tool, decision = %advice.decision, "advisor decided");
                verdict = advice;
            }
        }

        info!(tool = %action.tool, decision = %verdict.decision, "decision");

        // ── Step 3: Record ───────────────────────────────────────────────────
        let entry = FeedbackEntry::new(
            request.id.clone(),
            request.session_id.clone(),
            action,
            verdict.decision,
        );
        if let Err(e) = self.feedback.append(&entry) {
            warn!(id = %request.id, error = %e, "failed to record feedback entry");
        }

        verdict
    }

    /// Record the outcome of a previously decided request.
    ///
    /// Returns whether an entry with `id` was found within
    /// `search_window_days`. Storage errors are logged and reported as
    /// "not updated".
    pub fn report_executed(&self, id: &str, executed: Executed, search_window_days: u32) -> bool {
        match self.feedback.patch_executed(id, executed, search_window_days) {
            Ok(true) => true,
            Ok(false) => {
                debug!(id = %id, "no feedback entry found to patch");
                false
            }
            Err(e) => {
                warn!(id = %id, error = %e, "failed to patch feedback entry");
                false
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
