//! The default advisor.

use tollgate_contracts::{action::Action, learning::Suggestion, policy::Verdict};

use crate::traits::Advisor;

/// An advisor with no opinion: it always defers and never rewrites.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAdvisor;

impl Advisor for NoopAdvisor {
    fn decide(&self, _action: &Action) -> Verdict {
        Verdict::ask()
    }

    fn enrich(&self, suggestion: Suggestion) -> Suggestion {
        suggestion
    }
}
