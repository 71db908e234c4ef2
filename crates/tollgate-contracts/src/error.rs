//! Error types for the tollgate engine.
//!
//! Every fallible library function returns `GateResult<T>`. None of these
//! errors is fatal to the host: orchestration code logs them and degrades to
//! the safest default (`ask`).

use std::path::Path;

use thiserror::Error;

/// The unified error type for the tollgate crates.
#[derive(Debug, Error)]
pub enum GateError {
    /// Reading or writing a rule, log, queue or counter file failed.
    #[error("I/O error on '{path}': {reason}")]
    Io { path: String, reason: String },

    /// A stored record or document could not be decoded.
    #[error("parse error: {reason}")]
    Parse { reason: String },

    /// A rule carries a pattern that does not compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The configuration document is malformed.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// A store could not complete an operation for a non-I/O reason
    /// (lock acquisition, serialization).
    #[error("storage error: {reason}")]
    Storage { reason: String },

    /// The caller's request could not be interpreted.
    #[error("invalid caller input: {reason}")]
    InvalidInput { reason: String },
}

impl GateError {
    /// Wrap an `std::io::Error` together with the path it occurred on.
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        GateError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Convenience alias used throughout the tollgate crates.
pub type GateResult<T> = Result<T, GateError>;
