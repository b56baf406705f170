//! Append-only snapshot logs
//!
//! A snapshot log records the full content of a file each time it is
//! committed. Two backends are provided:
//!
//! - [`GitLog`]: one commit per entry in a git repository rooted at the
//!   data directory, so history stays browsable with ordinary git tools.
//! - [`FileLog`]: a self-contained log kept beside the working files.
//!
//! ```text
//! data/
//! ├── settings.json
//! ├── pipeline.yaml
//! └── .history/                  (FileLog only)
//!     └── settings.json/
//!         ├── index.jsonl
//!         └── objects/
//!             └── 3f9a...c2
//! ```

mod file;
mod git;

pub use file::FileLog;
pub use git::GitLog;

use chrono::{DateTime, Utc};

use crate::config::{LogBackend, StoreConfig};
use crate::error::Result;
use crate::history::HistoryEntry;

/// A historical version of a file together with its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub entry: HistoryEntry,
    pub content: String,
}

/// Append-only, per-file log of full-content snapshots.
///
/// Callers serialize `append` per filename. Implementations must tolerate
/// `entries` and `snapshot` running concurrently with an append.
pub trait SnapshotLog: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Record `content` as the newest version of `filename`.
    ///
    /// The working file already holds `content` when this is called.
    fn append(
        &self,
        filename: &str,
        content: &str,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<HistoryEntry>;

    /// Up to `limit` entries for `filename`, newest first
    fn entries(&self, filename: &str, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Resolve `id` within the history of `filename`.
    ///
    /// Returns `None` when no entry of that file matches.
    fn snapshot(&self, filename: &str, id: &str) -> Result<Option<Snapshot>>;
}

/// Open the backend selected by `config` over its data directory
pub fn open_log(config: &StoreConfig) -> Result<Box<dyn SnapshotLog>> {
    let root = config.data_dir();
    let log: Box<dyn SnapshotLog> = match config.backend {
        LogBackend::Git => Box::new(GitLog::open(
            &root,
            &config.author_name,
            &config.author_email,
        )?),
        LogBackend::File => Box::new(FileLog::open(&root)?),
    };
    Ok(log)
}
