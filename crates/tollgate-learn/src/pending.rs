//! Queue of globally-scoped suggestions awaiting the user's confirmation.
//!
//! The queue is one pretty-printed JSON array, rewritten wholesale under an
//! advisory lock on every change.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{info, warn};

use tollgate_contracts::{
    error::{GateError, GateResult},
    learning::{PendingGlobalRule, Scope, Suggestion},
};
use tollgate_policy::RuleWriter;

/// Default queue file name inside the state directory.
pub const PENDING_FILE: &str = "pending_global_rules.json";

/// What the user decided about a pending rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Persist to the global learned-rules document.
    Global,
    /// Persist to the current project's learned-rules document instead.
    ProjectOnly,
    /// Drop the rule.
    Dismiss,
}

impl Resolution {
    fn scope(self) -> Option<Scope> {
        match self {
            Resolution::Global => Some(Scope::Global),
            Resolution::ProjectOnly => Some(Scope::Project),
            Resolution::Dismiss => None,
        }
    }
}

/// A resolved queue entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub entry: PendingGlobalRule,
    /// Id of the persisted rule. `None` when dismissed, or when the rule was
    /// already present in the target document.
    pub rule_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PendingQueue {
    path: PathBuf,
}

impl PendingQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every queued rule, oldest first. A missing or unreadable queue is
    /// empty.
    pub fn list(&self) -> Vec<PendingGlobalRule> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => decode(&self.path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read pending queue");
                Vec::new()
            }
        }
    }

    /// Queue `rule`. Returns the new entry's id, or `None` if the same rule
    /// is already queued.
    pub fn add(&self, rule: Suggestion, reason: impl Into<String>) -> GateResult<Option<String>> {
        let reason = reason.into();
        self.update(|entries| {
            if entries.iter().any(|p| p.rule.same_rule(&rule)) {
                return Ok((false, None));
            }
            let pending = PendingGlobalRule::new(rule, reason);
            let id = pending.id.clone();
            info!(pending_id = %id, tool = %pending.rule.tool, "queued global rule for confirmation");
            entries.push(pending);
            Ok((true, Some(id)))
        })
    }

    /// Remove the entry `id` and act on `resolution`. Unknown ids yield
    /// `Ok(None)` and change nothing.
    ///
    /// The rule is persisted before the entry is removed, so a failed write
    /// leaves it queued.
    pub fn resolve(
        &self,
        id: &str,
        resolution: Resolution,
        writer: &RuleWriter,
    ) -> GateResult<Option<Resolved>> {
        self.update(|entries| {
            let Some(index) = entries.iter().position(|p| p.id == id) else {
                return Ok((false, None));
            };

            let rule_id = match resolution.scope() {
                Some(scope) => writer.save(&entries[index].rule, scope)?,
                None => None,
            };
            let entry = entries.remove(index);
            info!(pending_id = %id, resolution = ?resolution, rule_id = ?rule_id, "resolved pending rule");
            Ok((true, Some(Resolved { entry, rule_id })))
        })
    }

    /// Run `f` on the locked queue. `f` returns whether the queue changed
    /// and a value to pass through; the file is rewritten only on change.
    fn update<T>(
        &self,
        f: impl FnOnce(&mut Vec<PendingGlobalRule>) -> GateResult<(bool, T)>,
    ) -> GateResult<T> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GateError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| GateError::io(&self.path, e))?;

        let locked = match file.lock_exclusive() {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not lock pending queue");
                false
            }
        };
        let result = self.update_locked(&mut file, f);
        if locked {
            let _ = FileExt::unlock(&file);
        }
        result
    }

    fn update_locked<T>(
        &self,
        file: &mut File,
        f: impl FnOnce(&mut Vec<PendingGlobalRule>) -> GateResult<(bool, T)>,
    ) -> GateResult<T> {
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| GateError::io(&self.path, e))?;
        let mut entries = decode(&self.path, &content);

        let (changed, value) = f(&mut entries)?;
        if changed {
            let encoded = serde_json::to_string_pretty(&entries).map_err(|e| GateError::Storage {
                reason: format!("failed to encode pending queue: {e}"),
            })?;
            file.seek(SeekFrom::Start(0))
                .map_err(|e| GateError::io(&self.path, e))?;
            file.set_len(0).map_err(|e| GateError::io(&self.path, e))?;
            file.write_all(encoded.as_bytes())
                .map_err(|e| GateError::io(&self.path, e))?;
        }
        Ok(value)
    }
}

fn decode(path: &Path, content: &str) -> Vec<PendingGlobalRule> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "pending queue is not valid JSON; treating as empty");
        Vec::new()
    })
}
