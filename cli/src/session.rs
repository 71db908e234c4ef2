//! End-of-session review: statistics over one session's decisions, written
//! as a Markdown note next to the feedback log.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use tollgate_contracts::{
    config::SessionReviewConfig,
    error::{GateError, GateResult},
    feedback::{Executed, FeedbackEntry},
    policy::Decision,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub total: usize,
    pub auto_allowed: usize,
    pub auto_denied: usize,
    pub user_approved: usize,
    pub user_rejected: usize,
}

impl SessionStats {
    pub fn from_entries(entries: &[FeedbackEntry]) -> Self {
        let mut stats = Self {
            total: entries.len(),
            ..Self::default()
        };
        for entry in entries {
            match (entry.decision, entry.executed) {
                (Decision::Allow, _) => stats.auto_allowed += 1,
                (Decision::Deny, _) => stats.auto_denied += 1,
                (Decision::Ask, Executed::Yes) => stats.user_approved += 1,
                (Decision::Ask, Executed::No) => stats.user_rejected += 1,
                (Decision::Ask, Executed::Unknown) => {}
            }
        }
        stats
    }

    /// Share of decisions made without asking, in whole percent.
    pub fn automation_percent(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        (self.auto_allowed + self.auto_denied) * 100 / self.total
    }
}

/// Session id made safe to use as a file name.
pub fn file_stem(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == ':' { '_' } else { c })
        .collect()
}

pub fn render_summary(session_id: &str, stats: &SessionStats, at: DateTime<Local>) -> String {
    format!(
        "# Session summary\n\
         \n\
         **Session**: {session_id}\n\
         **Date**: {date}\n\
         \n\
         ## Statistics\n\
         \n\
         - Total actions: {total}\n\
         - Auto-allowed: {auto_allowed}\n\
         - Auto-denied: {auto_denied}\n\
         - User-approved: {user_approved}\n\
         - User-rejected: {user_rejected}\n\
         - Decided without asking: {automation}%\n",
        date = at.format("%Y-%m-%d %H:%M"),
        total = stats.total,
        auto_allowed = stats.auto_allowed,
        auto_denied = stats.auto_denied,
        user_approved = stats.user_approved,
        user_rejected = stats.user_rejected,
        automation = stats.automation_percent(),
    )
}

/// Summarize `session_id` from `todays_entries` into `sessions_dir`.
///
/// Returns the written file, or `None` when reviews are disabled or the
/// session has fewer than `min_actions` recorded decisions.
pub fn review(
    config: &SessionReviewConfig,
    todays_entries: &[FeedbackEntry],
    session_id: &str,
    sessions_dir: &Path,
    now: DateTime<Local>,
) -> GateResult<Option<PathBuf>> {
    if !config.enabled {
        return Ok(None);
    }

    let session: Vec<FeedbackEntry> = todays_entries
        .iter()
        .filter(|e| e.session_id == session_id)
        .cloned()
        .collect();
    if session.len() < config.min_actions {
        debug!(
            session_id = %session_id,
            actions = session.len(),
            min_actions = config.min_actions,
            "session too short to review"
        );
        return Ok(None);
    }

    let stats = SessionStats::from_entries(&session);
    std::fs::create_dir_all(sessions_dir).map_err(|e| GateError::io(sessions_dir, e))?;
    let path = sessions_dir.join(format!("{}.md", file_stem(session_id)));
    std::fs::write(&path, render_summary(session_id, &stats, now))
        .map_err(|e| GateError::io(&path, e))?;

    info!(session_id = %session_id, total = stats.total, "session summary written");
    Ok(Some(path))
}
