//! Filesystem layout of one tollgate installation.

use std::path::PathBuf;

use tracing::warn;

use tollgate_contracts::{
    config::GateConfig,
    error::{GateError, GateResult},
};
use tollgate_feedback::{FeedbackLog, FileCallCounter, COUNTER_FILE};
use tollgate_learn::{pending::PENDING_FILE, PendingQueue};
use tollgate_policy::{MemoryBank, RuleStore, RuleWriter};

pub const CONFIG_FILE: &str = "config.toml";

/// Resolved home and project directories, and everything derived from them.
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
    pub project_dir: PathBuf,
}

impl Paths {
    /// Fill in missing overrides from the user's home directory and the
    /// current working directory.
    pub fn resolve(home: Option<PathBuf>, project_dir: Option<PathBuf>) -> GateResult<Self> {
        let home = match home {
            Some(home) => home,
            None => dirs::home_dir().ok_or_else(|| GateError::Config {
                reason: "could not determine the home directory; pass --home".to_string(),
            })?,
        };
        let project_dir = match project_dir {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(|e| GateError::io(std::path::Path::new("."), e))?,
        };
        Ok(Self { home, project_dir })
    }

    /// `~/.claude/auto-decision`: config, pending queue, counter.
    pub fn state_dir(&self) -> PathBuf {
        self.home.join(".claude").join("auto-decision")
    }

    pub fn bank(&self) -> MemoryBank {
        MemoryBank::from_dirs(&self.home, &self.project_dir)
    }

    /// The configuration, or defaults if it is missing or malformed.
    pub fn config(&self) -> GateConfig {
        let path = self.state_dir().join(CONFIG_FILE);
        GateConfig::load(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unusable config");
            GateConfig::default()
        })
    }

    pub fn rule_store(&self) -> RuleStore {
        RuleStore::from_memory_bank(&self.bank())
    }

    pub fn rule_writer(&self) -> RuleWriter {
        RuleWriter::new(self.bank())
    }

    pub fn feedback_log(&self) -> FeedbackLog {
        FeedbackLog::new(self.bank().feedback_dir())
    }

    pub fn pending_queue(&self) -> PendingQueue {
        PendingQueue::new(self.state_dir().join(PENDING_FILE))
    }

    pub fn call_counter(&self) -> FileCallCounter {
        FileCallCounter::new(self.state_dir().join(COUNTER_FILE))
    }
}
