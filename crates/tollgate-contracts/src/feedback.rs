//! Feedback records: one per decision request.
//!
//! A `FeedbackEntry` is created when a decision is made, with its outcome
//! unknown. If the host later confirms the action actually ran, the entry is
//! patched exactly once to record that. Entries are never deleted.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    action::{Action, SimplifiedInput},
    policy::Decision,
};

/// Tri-state execution outcome of a decision request.
///
/// Encoded on disk as `null`, `true` or `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Executed {
    /// No outcome reported yet.
    #[default]
    Unknown,
    /// The action was confirmed executed.
    Yes,
    /// The action was confirmed not executed.
    No,
}

impl Executed {
    pub fn is_known(self) -> bool {
        self != Executed::Unknown
    }
}

impl From<bool> for Executed {
    fn from(value: bool) -> Self {
        if value {
            Executed::Yes
        } else {
            Executed::No
        }
    }
}

impl From<Option<bool>> for Executed {
    fn from(value: Option<bool>) -> Self {
        value.map(Executed::from).unwrap_or(Executed::Unknown)
    }
}

impl From<Executed> for Option<bool> {
    fn from(value: Executed) -> Self {
        match value {
            Executed::Unknown => None,
            Executed::Yes => Some(true),
            Executed::No => Some(false),
        }
    }
}

/// A single line of the feedback log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Opaque correlation id supplied by the caller (the host's tool-use id).
    pub id: String,

    /// Creation time. The entry lives in the partition of this instant's
    /// local calendar date. Timestamps without an offset are read as local
    /// time.
    #[serde(rename = "ts", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub session_id: String,

    pub tool: String,

    #[serde(rename = "input", default)]
    pub input: SimplifiedInput,

    /// The automated decision made at request time.
    #[serde(rename = "auto_decision")]
    pub decision: Decision,

    #[serde(default)]
    pub executed: Executed,
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = raw
        .parse::<NaiveDateTime>()
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))?;
    // A local time skipped by a DST jump has no mapping; read it as UTC.
    Ok(Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive)))
}

impl FeedbackEntry {
    /// Build a fresh entry for `action`, timestamped now, outcome unknown.
    pub fn new(
        id: impl Into<String>,
        session_id: impl Into<String>,
        action: &Action,
        decision: Decision,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now(),
            session_id: session_id.into(),
            tool: action.tool.clone(),
            input: SimplifiedInput::from_input(&action.input),
            decision,
            executed: Executed::Unknown,
        }
    }

    /// The calendar date (local time) of the partition this entry belongs to.
    pub fn partition_date(&self) -> NaiveDate {
        self.timestamp.with_timezone(&Local).date_naive()
    }

    /// True when the request was deferred to a human and the outcome is known.
    /// Only these entries say anything about the user's preferences.
    pub fn is_resolved_ask(&self) -> bool {
        self.decision == Decision::Ask && self.executed.is_known()
    }
}
