//! File-backed, day-partitioned feedback log.
//!
//! One JSON Lines file per local calendar date (`<dir>/YYYY-MM-DD.jsonl`).
//! Appends never rewrite a partition. Patching an entry's outcome rewrites
//! the one partition that holds it: every line is written back unchanged
//! except the patched record, and lines that do not parse are preserved
//! verbatim. Only the `executed` field of a patched record changes; fields
//! this crate does not know about are kept.
//!
//! # Concurrency
//!
//! Appends and patches take an advisory exclusive lock (`fs2`) on the
//! partition file, which serializes cooperating processes. Writers that do
//! not take the lock, or filesystems without advisory locking, fall back to
//! last-writer-wins on patch. This is a known limitation.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{Days, Local, NaiveDate};
use fs2::FileExt;
use serde_json::Value;
use tracing::{debug, warn};

use tollgate_contracts::{
    error::{GateError, GateResult},
    feedback::{Executed, FeedbackEntry},
};
use tollgate_core::traits::FeedbackStore;

/// The day-partitioned feedback log in one directory.
#[derive(Debug, Clone)]
pub struct FeedbackLog {
    dir: PathBuf,
}

impl FeedbackLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the partition for `date`.
    pub fn partition_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.jsonl", date.format("%Y-%m-%d")))
    }

    /// Read and decode one partition. A missing partition is empty; lines
    /// that do not decode are skipped.
    pub fn read_partition(&self, date: NaiveDate) -> GateResult<Vec<FeedbackEntry>> {
        let path = self.partition_path(date);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(GateError::io(&path, e)),
        };

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<FeedbackEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping undecodable feedback line");
                    None
                }
            })
            .collect())
    }

    /// Set `executed` on the entry with `id`, searching the `days` days
    /// ending at `today`, most recent first.
    ///
    /// Only the first partition containing `id` is rewritten. Returns
    /// `Ok(false)` and writes nothing when `id` is not in the window.
    pub fn patch_executed_from(
        &self,
        today: NaiveDate,
        id: &str,
        executed: Executed,
        days: u32,
    ) -> GateResult<bool> {
        for date in window(today, days) {
            let path = self.partition_path(date);
            let file = match OpenOptions::new().read(true).write(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(GateError::io(&path, e)),
            };

            let patched = with_lock(&file, &path, |file| patch_partition(file, &path, id, executed))?;
            if patched {
                debug!(id = %id, date = %date, executed = ?executed, "patched feedback entry");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Every entry of the `days` days ending at `today`.
    ///
    /// Within a day, entries are in file order; days are visited most recent
    /// first. An unreadable partition is logged and skipped.
    pub fn recent_from(&self, today: NaiveDate, days: u32) -> Vec<FeedbackEntry> {
        let mut entries = Vec::new();
        for date in window(today, days) {
            match self.read_partition(date) {
                Ok(partition) => entries.extend(partition),
                Err(e) => warn!(date = %date, error = %e, "skipping unreadable feedback partition"),
            }
        }
        entries
    }
}

impl FeedbackStore for FeedbackLog {
    /// Append `entry` as one line of its creation date's partition.
    fn append(&self, entry: &FeedbackEntry) -> GateResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| GateError::io(&self.dir, e))?;

        let path = self.partition_path(entry.partition_date());
        let mut line = serde_json::to_string(entry).map_err(|e| GateError::Storage {
            reason: format!("failed to encode feedback entry '{}': {e}", entry.id),
        })?;
        line.push('\n');

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| GateError::io(&path, e))?;

        with_lock(&file, &path, |mut file| {
            file.write_all(line.as_bytes()).map_err(|e| GateError::io(&path, e))
        })
    }

    fn patch_executed(&self, id: &str, executed: Executed, search_window_days: u32) -> GateResult<bool> {
        self.patch_executed_from(Local::now().date_naive(), id, executed, search_window_days)
    }

    fn recent(&self, days: u32) -> GateResult<Vec<FeedbackEntry>> {
        Ok(self.recent_from(Local::now().date_naive(), days))
    }
}

/// The `days` dates ending at `today`, most recent first.
pub(crate) fn window(today: NaiveDate, days: u32) -> impl Iterator<Item = NaiveDate> {
    (0..u64::from(days)).filter_map(move |i| today.checked_sub_days(Days::new(i)))
}

/// Run `f` while holding an exclusive advisory lock on `file`.
///
/// A lock that cannot be taken is logged and `f` runs anyway.
fn with_lock<T>(file: &File, path: &Path, f: impl FnOnce(&File) -> GateResult<T>) -> GateResult<T> {
    let locked = match file.lock_exclusive() {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not lock feedback partition");
            false
        }
    };
    let result = f(file);
    if locked {
        let _ = FileExt::unlock(file);
    }
    result
}

/// Rewrite the partition behind `file` with every record matching `id`
/// patched. Returns whether any record matched; nothing is written if none
/// did.
fn patch_partition(mut file: &File, path: &Path, id: &str, executed: Executed) -> GateResult<bool> {
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| GateError::io(path, e))?;

    let mut found = false;
    let mut lines = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        match serde_json::from_str::<Value>(line) {
            Ok(mut record) if record.get("id").and_then(Value::as_str) == Some(id) => {
                record["executed"] = Value::from(Option::<bool>::from(executed));
                found = true;
                lines.push(record.to_string());
            }
            _ => lines.push(line.to_string()),
        }
    }

    if !found {
        return Ok(false);
    }

    let mut rewritten = lines.join("\n");
    rewritten.push('\n');

    file.seek(SeekFrom::Start(0)).map_err(|e| GateError::io(path, e))?;
    file.set_len(0).map_err(|e| GateError::io(path, e))?;
    file.write_all(rewritten.as_bytes())
        .map_err(|e| GateError::io(path, e))?;
    Ok(true)
}
