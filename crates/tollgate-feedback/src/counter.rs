//! File-persisted call counter.
//!
//! The count is stored as a decimal integer in a single file. A missing or
//! unreadable file counts as zero, so a corrupted counter only delays the
//! next learning cycle.

use std::path::{Path, PathBuf};

use tracing::debug;

use tollgate_contracts::error::{GateError, GateResult};
use tollgate_core::traits::CallCounter;

/// Default counter file name inside the state directory.
pub const COUNTER_FILE: &str = ".experience_counter";

#[derive(Debug, Clone)]
pub struct FileCallCounter {
    path: PathBuf,
}

impl FileCallCounter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current count. Never fails.
    pub fn current(&self) -> u64 {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    }

    fn store(&self, value: u64) -> GateResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GateError::io(parent, e))?;
        }
        std::fs::write(&self.path, value.to_string()).map_err(|e| GateError::io(&self.path, e))
    }
}

impl CallCounter for FileCallCounter {
    fn increment(&self) -> GateResult<u64> {
        let next = self.current().saturating_add(1);
        self.store(next)?;
        debug!(count = next, path = %self.path.display(), "call counter incremented");
        Ok(next)
    }

    fn reset(&self) -> GateResult<()> {
        self.store(0)
    }
}
