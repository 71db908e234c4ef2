//! The background learning cycle.
//!
//! Paced by a persisted call counter, the cycle mines the recent feedback
//! window, lets the advisor refine each suggestion, scopes it, and then
//! either writes it to the project's learned rules or queues it for global
//! confirmation. It never runs inside the decision path.

use tracing::{debug, info, warn};

use tollgate_contracts::{
    config::LearningConfig,
    learning::{Scope, Suggestion},
};
use tollgate_core::{
    traits::{Advisor, CallCounter, FeedbackStore},
    NoopAdvisor,
};
use tollgate_policy::RuleWriter;

use crate::{miner, pending::PendingQueue, scope};

/// What happened to one mined suggestion.
#[derive(Debug, Clone, PartialEq)]
pub enum LearnOutcome {
    /// Written to the project's learned-rules document.
    SavedProject { rule_id: String, suggestion: Suggestion },
    /// Queued for the user to confirm as a global rule.
    QueuedGlobal {
        pending_id: String,
        suggestion: Suggestion,
        /// Why the rule was considered global.
        reason: String,
    },
    /// Already learned or already queued.
    Skipped { suggestion: Suggestion, scope: Scope },
}

pub struct LearningCycle {
    config: LearningConfig,
    feedback: Box<dyn FeedbackStore>,
    counter: Box<dyn CallCounter>,
    advisor: Box<dyn Advisor>,
    writer: RuleWriter,
    pending: PendingQueue,
}

impl LearningCycle {
    /// Create a cycle with the no-op advisor.
    pub fn new(
        config: LearningConfig,
        feedback: Box<dyn FeedbackStore>,
        counter: Box<dyn CallCounter>,
        writer: RuleWriter,
        pending: PendingQueue,
    ) -> Self {
        Self {
            config,
            feedback,
            counter,
            advisor: Box::new(NoopAdvisor),
            writer,
            pending,
        }
    }

    /// Replace the advisor used to refine suggestions.
    pub fn with_advisor(mut self, advisor: Box<dyn Advisor>) -> Self {
        self.advisor = advisor;
        self
    }

    /// Count one call and run the cycle on every `interval`-th.
    ///
    /// Returns no outcomes when learning is disabled, between runs, or when
    /// the counter cannot be updated.
    pub fn tick(&self) -> Vec<LearnOutcome> {
        if !self.config.enabled {
            return Vec::new();
        }

        let count = match self.counter.increment() {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "failed to update learning counter");
                return Vec::new();
            }
        };
        if count < self.config.interval.max(1) {
            debug!(count, interval = self.config.interval, "learning not due");
            return Vec::new();
        }

        if let Err(e) = self.counter.reset() {
            warn!(error = %e, "failed to reset learning counter");
        }
        self.run()
    }

    /// Mine, scope and persist, unconditionally.
    ///
    /// Storage failures are logged; the affected suggestion yields no
    /// outcome and the rest still run.
    pub fn run(&self) -> Vec<LearnOutcome> {
        let entries = match self.feedback.recent(self.config.window_days) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "failed to read feedback history");
                return Vec::new();
            }
        };

        let suggestions = miner::scan(&entries, self.config.threshold, self.config.confidence_min);
        info!(
            entries = entries.len(),
            suggestions = suggestions.len(),
            "learning cycle mined feedback"
        );

        suggestions
            .into_iter()
            .filter_map(|s| self.persist(self.advisor.enrich(s)))
            .collect()
    }

    fn persist(&self, suggestion: Suggestion) -> Option<LearnOutcome> {
        let (scope, reason) = scope::classify(&suggestion);
        debug!(tool = %suggestion.tool, scope = %scope, reason = %reason, "classified suggestion");

        let result = match scope {
            Scope::Project => self.writer.save(&suggestion, Scope::Project).map(|saved| match saved {
                Some(rule_id) => LearnOutcome::SavedProject { rule_id, suggestion },
                None => LearnOutcome::Skipped { suggestion, scope },
            }),
            Scope::Global if self.writer.contains(&suggestion, Scope::Global) => {
                Ok(LearnOutcome::Skipped { suggestion, scope })
            }
            Scope::Global => self
                .pending
                .add(suggestion.clone(), reason.clone())
                .map(|queued| match queued {
                    Some(pending_id) => LearnOutcome::QueuedGlobal {
                        pending_id,
                        suggestion,
                        reason,
                    },
                    None => LearnOutcome::Skipped { suggestion, scope },
                }),
        };

        match result {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(scope = %scope, error = %e, "failed to persist learned rule");
                None
            }
        }
    }
}
