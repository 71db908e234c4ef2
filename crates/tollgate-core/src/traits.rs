//! Collaborator traits for a tollgate evaluation pass.
//!
//! - `PolicyEngine`: evaluates a proposed action against the rule set
//! - `FeedbackStore`: append-and-patch record of every decision
//! - `Advisor`: optional external opinion (no-op by default)
//! - `CallCounter`: persisted counter that paces background learning
//!
//! The `Gate` wires the first three together for one decision. None of these
//! traits is async: a pass is a single synchronous, non-reentrant call.

use tollgate_contracts::{
    action::Action,
    error::GateResult,
    feedback::{Executed, FeedbackEntry},
    learning::Suggestion,
    policy::Verdict,
};

/// The rule evaluator.
///
/// Implementations must be deterministic for a given rule set. Returning
/// `Verdict::ask()` means no rule matched.
pub trait PolicyEngine: Send + Sync {
    /// Evaluate `action` and return the decision of the first matching rule.
    fn evaluate(&self, action: &Action) -> GateResult<Verdict>;
}

/// The feedback log.
///
/// Entries are appended at decision time and patched at most once when the
/// host reports the outcome. Entries are never removed.
pub trait FeedbackStore: Send + Sync {
    /// Append `entry` to the partition of its creation date.
    fn append(&self, entry: &FeedbackEntry) -> GateResult<()>;

    /// Set the `executed` field of the entry with `id`, searching the most
    /// recent `search_window_days` days. Returns `Ok(false)` if no entry
    /// with that id exists in the window.
    fn patch_executed(&self, id: &str, executed: Executed, search_window_days: u32)
        -> GateResult<bool>;

    /// Every entry of the trailing `days` days.
    fn recent(&self, days: u32) -> GateResult<Vec<FeedbackEntry>>;
}

/// An external source of judgement, e.g. a language model.
///
/// Both operations are infallible from the caller's point of view: an
/// implementation that times out or fails must return its input unchanged
/// (or `Verdict::ask()`), so the deterministic path always stands.
pub trait Advisor: Send + Sync {
    /// Offer a decision for an action no rule matched.
    fn decide(&self, action: &Action) -> Verdict;

    /// Refine a mined suggestion (generalize its pattern, reword its reason).
    fn enrich(&self, suggestion: Suggestion) -> Suggestion;
}

/// A persisted counter, e.g. "run mining every Nth report".
pub trait CallCounter: Send + Sync {
    /// Increment and return the new count.
    fn increment(&self) -> GateResult<u64>;

    /// Reset the count to zero.
    fn reset(&self) -> GateResult<()>;
}
