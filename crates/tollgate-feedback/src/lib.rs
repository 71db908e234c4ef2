//! # tollgate-feedback
//!
//! Append-and-patch feedback log for the tollgate approval engine.
//!
//! ## Overview
//!
//! Every decision is appended as one JSON line to the partition of its
//! creation date, with its outcome unknown. When the host later reports
//! whether the action ran, the entry is patched in place. The trailing
//! window of entries is what the pattern miner learns from.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tollgate_feedback::FeedbackLog;
//! use tollgate_core::traits::FeedbackStore;
//!
//! let log = FeedbackLog::new(bank.feedback_dir());
//! log.append(&entry)?;
//! log.patch_executed(&entry.id, Executed::Yes, 7)?;
//! let history = log.recent(30)?;
//! ```

pub mod counter;
pub mod log;
pub mod memory;

pub use counter::{FileCallCounter, COUNTER_FILE};
pub use log::FeedbackLog;
pub use memory::InMemoryFeedbackLog;

// ── Tests ─────────────────────────────────────────────────────────────────────
