//! # tollgate-core
//!
//! The single-pass decision gate for tollgate.
//!
//! This crate provides:
//! - The collaborator traits (`PolicyEngine`, `FeedbackStore`, `Advisor`,
//!   `CallCounter`)
//! - `NoopAdvisor`, the default advisor
//! - The `Gate` that wires them together in the correct order
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tollgate_core::{Gate, DecisionRequest};
//!
//! let gate = Gate::new(Box::new(policy), Box::new(feedback_log));
//! let verdict = gate.decide(&request);
//! ```

pub mod advisor;
pub mod gate;
pub mod traits;

pub use advisor::NoopAdvisor;
pub use gate::{DecisionRequest, Gate};
