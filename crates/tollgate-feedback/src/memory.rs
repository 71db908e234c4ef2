//! In-memory implementation of `FeedbackStore`.
//!
//! `InMemoryFeedbackLog` keeps every entry in a `Vec` behind a `Mutex`. It
//! honors the same day windows as the file log, keyed on each entry's
//! partition date, and is what tests and dry runs wire into a `Gate`.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Days, Local, NaiveDate};

use tollgate_contracts::{
    error::{GateError, GateResult},
    feedback::{Executed, FeedbackEntry},
};
use tollgate_core::traits::FeedbackStore;

/// A feedback store that never touches disk.
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeedbackLog {
    entries: Arc<Mutex<Vec<FeedbackEntry>>>,
}

impl InMemoryFeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `entries`, in order.
    pub fn with_entries(entries: impl IntoIterator<Item = FeedbackEntry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries.into_iter().collect())),
        }
    }

    /// A copy of every entry, in append order.
    pub fn snapshot(&self) -> Vec<FeedbackEntry> {
        self.lock().map(|entries| entries.clone()).unwrap_or_default()
    }

    fn lock(&self) -> GateResult<MutexGuard<'_, Vec<FeedbackEntry>>> {
        self.entries.lock().map_err(|e| GateError::Storage {
            reason: format!("feedback state lock poisoned: {e}"),
        })
    }
}

/// Earliest date inside a `days`-day window ending at `today`.
fn window_start(today: NaiveDate, days: u32) -> Option<NaiveDate> {
    if days == 0 {
        return None;
    }
    today.checked_sub_days(Days::new(u64::from(days) - 1))
}

impl FeedbackStore for InMemoryFeedbackLog {
    fn append(&self, entry: &FeedbackEntry) -> GateResult<()> {
        self.lock()?.push(entry.clone());
        Ok(())
    }

    fn patch_executed(&self, id: &str, executed: Executed, search_window_days: u32) -> GateResult<bool> {
        let Some(start) = window_start(Local::now().date_naive(), search_window_days) else {
            return Ok(false);
        };
        let mut entries = self.lock()?;
        let mut found = false;
        for entry in entries
            .iter_mut()
            .filter(|e| e.id == id && e.partition_date() >= start)
        {
            entry.executed = executed;
            found = true;
        }
        Ok(found)
    }

    fn recent(&self, days: u32) -> GateResult<Vec<FeedbackEntry>> {
        let Some(start) = window_start(Local::now().date_naive(), days) else {
            return Ok(Vec::new());
        };
        Ok(self
            .lock()?
            .iter()
            .filter(|e| e.partition_date() >= start)
            .cloned()
            .collect())
    }
}
