//! # tollgate-learn
//!
//! Learning new rules from how the user resolved deferred decisions.
//!
//! ## Pipeline
//!
//! 1. **Mine**: [`miner::scan`] groups resolved `ask` entries by a derived
//!    key (command prefix, file extension, or tool) and emits a
//!    [`Suggestion`](tollgate_contracts::learning::Suggestion) for every
//!    group that is large and one-sided enough.
//! 2. **Scope**: [`scope::classify`] decides whether a suggestion belongs to
//!    the project or to every project.
//! 3. **Persist**: project rules go straight to the project's learned-rules
//!    document; global rules wait in the [`PendingQueue`] until the user
//!    confirms them.
//!
//! [`LearningCycle`] drives the three steps, paced by a call counter.

pub mod cycle;
pub mod miner;
pub mod pending;
pub mod scope;

pub use cycle::{LearnOutcome, LearningCycle};
pub use miner::{scan, PatternKey};
pub use pending::{PendingQueue, Resolution, Resolved};
pub use scope::classify;

// ── Tests ─────────────────────────────────────────────────────────────────────
