//! Configuration schema.
//!
//! Read from a TOML document. Every field carries a default, so an absent
//! file or a partially filled one yields a complete configuration:
//!
//! ```toml
//! [learning]
//! enabled = true
//! threshold = 3
//! confidence_min = 0.8
//! interval = 10
//! window_days = 30
//!
//! [feedback]
//! patch_window_days = 7
//!
//! [session_review]
//! enabled = true
//! min_actions = 5
//!
//! [advisor]
//! enabled = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GateError, GateResult};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub learning: LearningConfig,
    pub feedback: FeedbackConfig,
    pub session_review: SessionReviewConfig,
    pub advisor: AdvisorConfig,
}

/// Pattern-mining settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub enabled: bool,
    /// Minimum number of resolved ask-entries per group.
    pub threshold: u32,
    /// Minimum majority-side ratio for a group to yield a suggestion.
    pub confidence_min: f64,
    /// Mine on every Nth feedback report.
    pub interval: u64,
    /// How many trailing days of feedback to mine.
    pub window_days: u32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 3,
            confidence_min: 0.8,
            interval: 10,
            window_days: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// How many trailing days `patch_executed` searches for the entry.
    pub patch_window_days: u32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            patch_window_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionReviewConfig {
    pub enabled: bool,
    /// Sessions with fewer recorded actions are not summarized.
    pub min_actions: usize,
}

impl Default for SessionReviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_actions: 5,
        }
    }
}

/// Reserved for an external advisor. Only the no-op advisor ships.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub enabled: bool,
}

impl GateConfig {
    /// Parse `s` as a TOML configuration document.
    pub fn from_toml_str(s: &str) -> GateResult<Self> {
        toml::from_str(s).map_err(|e| GateError::Config {
            reason: format!("failed to parse config TOML: {e}"),
        })
    }

    /// Load the configuration at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> GateResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(GateError::io(path, e)),
        }
    }
}
