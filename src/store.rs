//! Versioned File Store
//!
//! The only path through which managed files change. Every mutation writes
//! the working file atomically and appends exactly one entry to the snapshot
//! log while holding that file's write lock. Readers take the read lock, so
//! they only ever see content whose entry has been committed (or rolled back).

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::atomic::{read_existing, write_atomic};
use crate::catalog::FileCatalog;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::format::{check_filename, FormatKind};
use crate::history::{
    format_timestamp, initial_message, restore_message, update_message, HistoryEntry,
    DEFAULT_HISTORY_LIMIT,
};
use crate::log::{open_log, SnapshotLog};
use crate::template;
use crate::validate::validate;

/// Behavior switches for a [`FileStore`]
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub history_limit: usize,
    pub allow_unknown_extensions: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            allow_unknown_extensions: false,
        }
    }
}

impl From<&StoreConfig> for StoreOptions {
    fn from(config: &StoreConfig) -> Self {
        Self {
            history_limit: config.history_limit,
            allow_unknown_extensions: config.allow_unknown_extensions,
        }
    }
}

/// Result of [`FileStore::read`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    pub content: String,
    /// The file did not exist and was created with starter content
    pub created: bool,
}

/// Result of [`FileStore::restore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    /// Content now current, equal to the restored snapshot
    pub content: String,
    /// Entry recording the restore
    pub entry: HistoryEntry,
}

/// Version-controlled store over one data directory
pub struct FileStore {
    root: PathBuf,
    log: Box<dyn SnapshotLog>,
    catalog: FileCatalog,
    options: StoreOptions,
    /// Commit locks, one per filename
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl FileStore {
    /// Open a store with the log backend named in `config`
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let root = config.data_dir();
        fs::create_dir_all(&root)?;
        let log = open_log(config)?;
        Self::with_log(root, log, StoreOptions::from(config))
    }

    /// Open a store over `root` with an explicit log
    pub fn with_log(
        root: impl AsRef<Path>,
        log: Box<dyn SnapshotLog>,
        options: StoreOptions,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(path = %root.display(), backend = log.name(), "opened file store");

        Ok(Self {
            catalog: FileCatalog::new(&root),
            root,
            log,
            options,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Get the data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Current content of `filename`, creating it with starter content
    /// (and an initial history entry) if it does not exist yet
    pub fn read(&self, filename: &str) -> Result<ReadOutcome> {
        let kind = self.resolve(filename)?;
        let path = self.root.join(filename);
        let lock = self.lock_for(filename);

        {
            let _shared = lock.read();
            if let Some(content) = read_existing(&path)? {
                return Ok(ReadOutcome {
                    content,
                    created: false,
                });
            }
        }

        let _guard = lock.write();

        // Another reader may have created it while we waited
        if let Some(content) = read_existing(&path)? {
            return Ok(ReadOutcome {
                content,
                created: false,
            });
        }

        let now = Utc::now();
        let content = kind
            .map(|kind| template::generate(kind, now))
            .unwrap_or_default();
        debug!(filename, "creating file with starter content");
        self.commit(filename, &path, &content, &initial_message(filename), now)?;

        Ok(ReadOutcome {
            content,
            created: true,
        })
    }

    /// Validate and save `content`, recording a new history entry
    pub fn write(&self, filename: &str, content: &str) -> Result<HistoryEntry> {
        let kind = self.resolve(filename)?;
        if let Some(kind) = kind {
            validate(content, kind)?;
        }

        let path = self.root.join(filename);
        let lock = self.lock_for(filename);
        let _guard = lock.write();

        let now = Utc::now();
        let message = update_message(filename, &format_timestamp(now));
        self.commit(filename, &path, content, &message, now)
    }

    /// Up to `limit` entries, newest first.
    ///
    /// Never fails: any problem resolving the history yields an empty list.
    pub fn history(&self, filename: &str, limit: usize) -> Vec<HistoryEntry> {
        let entries = self
            .resolve(filename)
            .and_then(|_| self.log.entries(filename, limit));

        match entries {
            Ok(entries) => entries,
            Err(e) => {
                warn!(filename, error = %e, "history unavailable");
                Vec::new()
            }
        }
    }

    /// History with the configured limit
    pub fn history_default(&self, filename: &str) -> Vec<HistoryEntry> {
        self.history(filename, self.options.history_limit)
    }

    /// Make the snapshot `entry_id` current again.
    ///
    /// History is never rewritten: the restore is recorded as a new entry.
    pub fn restore(&self, filename: &str, entry_id: &str) -> Result<Restored> {
        self.resolve(filename)?;
        let path = self.root.join(filename);
        let lock = self.lock_for(filename);
        let _guard = lock.write();

        let snapshot = self
            .log
            .snapshot(filename, entry_id)?
            .ok_or_else(|| StoreError::not_found(filename, entry_id))?;
        debug!(
            filename,
            from = %snapshot.entry.id,
            committed = %snapshot.entry.timestamp,
            "restoring snapshot"
        );

        let now = Utc::now();
        let entry = self.commit(
            filename,
            &path,
            &snapshot.content,
            &restore_message(entry_id),
            now,
        )?;

        Ok(Restored {
            content: snapshot.content,
            entry,
        })
    }

    /// Managed files currently in the data directory
    pub fn list(&self) -> Result<BTreeSet<String>> {
        self.catalog.list()
    }

    /// Check the filename and resolve its format.
    ///
    /// `None` means an unrecognized extension that the options allow.
    fn resolve(&self, filename: &str) -> Result<Option<FormatKind>> {
        check_filename(filename)?;
        match FormatKind::from_filename(filename) {
            Some(kind) => Ok(Some(kind)),
            None if self.options.allow_unknown_extensions => Ok(None),
            None => Err(StoreError::UnsupportedFormat(filename.to_string())),
        }
    }

    fn lock_for(&self, filename: &str) -> Arc<RwLock<()>> {
        self.locks
            .lock()
            .entry(filename.to_string())
            .or_default()
            .clone()
    }

    /// Replace the working file and append to the log. If the append fails
    /// the previous bytes are put back. Caller holds the write lock.
    fn commit(
        &self,
        filename: &str,
        path: &Path,
        content: &str,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<HistoryEntry> {
        let previous = read_existing(path)?;
        write_atomic(path, content.as_bytes())?;

        match self.log.append(filename, content, message, at) {
            Ok(entry) => {
                info!(filename, id = %entry.id, message = %entry.message, "committed");
                Ok(entry)
            }
            Err(err) => {
                warn!(filename, error = %err, "commit failed, rolling back working file");
                let rollback = match previous {
                    Some(previous) => write_atomic(path, previous.as_bytes()),
                    None => fs::remove_file(path).map_err(StoreError::from),
                };
                if let Err(e) = rollback {
                    warn!(filename, error = %e, "rollback failed");
                }
                Err(err)
            }
        }
    }
}
