//! History entries

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Default number of entries returned by a history listing
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// One immutable commit in a file's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Opaque version id assigned by the snapshot log
    pub id: String,
    /// Commit time, RFC 3339
    pub timestamp: String,
    /// Short description of the change
    pub message: String,
}

impl HistoryEntry {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: format_timestamp(timestamp),
            message: message.into(),
        }
    }
}

/// RFC 3339 with second precision in UTC, e.g. `2026-10-19T08:30:00Z`
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Message recorded when a file is first created
pub fn initial_message(filename: &str) -> String {
    format!("Initial: {}", filename)
}

/// Message recorded for a regular save
pub fn update_message(filename: &str, timestamp: &str) -> String {
    format!("Update {}: {}", filename, timestamp)
}

/// Message recorded when an earlier version is brought back
pub fn restore_message(entry_id: &str) -> String {
    format!("Restored to version {}", entry_id)
}
