//! Self-contained snapshot log
//!
//! Each managed file gets a directory under `.history/` holding an
//! append-only `index.jsonl` (one record per entry, oldest first) and an
//! `objects/` directory with one snapshot file per entry id. The snapshot is
//! written before its index record, so every indexed entry is recoverable.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Snapshot, SnapshotLog};
use crate::atomic::write_atomic;
use crate::checksum::Checksum;
use crate::error::{Result, StoreError};
use crate::history::{format_timestamp, HistoryEntry};

/// Directory under the data root holding the log
pub const HISTORY_DIR: &str = ".history";

const INDEX_FILE: &str = "index.jsonl";
const OBJECTS_DIR: &str = "objects";

/// Shortest id prefix accepted when resolving an entry
const MIN_PREFIX_LEN: usize = 4;

/// One line of `index.jsonl`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Record {
    id: String,
    parent: Option<String>,
    timestamp: String,
    message: String,
    checksum: Checksum,
}

impl Record {
    fn to_entry(&self) -> HistoryEntry {
        HistoryEntry {
            id: self.id.clone(),
            timestamp: self.timestamp.clone(),
            message: self.message.clone(),
        }
    }
}

/// Snapshot log stored as plain files beside the working files
pub struct FileLog {
    dir: PathBuf,
    append_lock: Mutex<()>,
}

impl FileLog {
    /// Open (or create) the log under `root/.history`
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(HISTORY_DIR);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            append_lock: Mutex::new(()),
        })
    }

    fn file_dir(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    fn object_path(&self, filename: &str, id: &str) -> PathBuf {
        self.file_dir(filename).join(OBJECTS_DIR).join(id)
    }

    /// Load all records for `filename`, oldest first
    fn records(&self, filename: &str) -> Result<Vec<Record>> {
        let index_path = self.file_dir(filename).join(INDEX_FILE);
        let raw = match fs::read_to_string(&index_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        let mut lines = raw.lines().peekable();
        while let Some(line) = lines.next() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Record>(line) {
                Ok(record) => records.push(record),
                // An append still in flight; its entry is not committed yet
                Err(_) if lines.peek().is_none() && !raw.ends_with('\n') => break,
                Err(e) => {
                    return Err(StoreError::Corrupt(format!(
                        "{}: {}",
                        index_path.display(),
                        e
                    )))
                }
            }
        }
        Ok(records)
    }

    fn load_object(&self, filename: &str, record: &Record) -> Result<String> {
        let path = self.object_path(filename, &record.id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Corrupt(format!(
                    "missing snapshot {} for {}",
                    record.id, filename
                )))
            }
            Err(e) => return Err(e.into()),
        };

        if !record.checksum.verify(&bytes) {
            return Err(StoreError::Corrupt(format!(
                "checksum mismatch for {} version {}",
                filename, record.id
            )));
        }
        String::from_utf8(bytes).map_err(|_| {
            StoreError::Corrupt(format!("{} version {} is not valid UTF-8", filename, record.id))
        })
    }
}

/// Append one complete line to an index file.
///
/// A torn tail from an interrupted append is cut off first. If the write or
/// `sync` fails, the index is truncated back to its committed length so it
/// never lists a record whose append reported failure.
fn append_record(
    index_path: &Path,
    line: &[u8],
    sync: impl FnOnce(&File) -> std::io::Result<()>,
) -> Result<()> {
    let mut index = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(index_path)?;

    let mut raw = Vec::new();
    index.read_to_end(&mut raw)?;
    let committed = raw
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos as u64 + 1);
    if committed < raw.len() as u64 {
        warn!(path = %index_path.display(), "discarding torn index record");
        index.set_len(committed)?;
    }
    index.seek(SeekFrom::Start(committed))?;

    if let Err(e) = index.write_all(line).and_then(|_| sync(&index)) {
        if let Err(undo) = index.set_len(committed) {
            warn!(path = %index_path.display(), error = %undo, "failed to truncate index");
        }
        return Err(e.into());
    }
    Ok(())
}

impl SnapshotLog for FileLog {
    fn name(&self) -> &'static str {
        "file"
    }

    fn append(
        &self,
        filename: &str,
        content: &str,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<HistoryEntry> {
        let _guard = self.append_lock.lock();

        let parent = self.records(filename)?.pop().map(|r| r.id);
        let timestamp = format_timestamp(at);
        let id = Checksum::of_fields([
            parent.as_deref().unwrap_or_default().as_bytes(),
            filename.as_bytes(),
            timestamp.as_bytes(),
            message.as_bytes(),
            content.as_bytes(),
        ])
        .to_string();

        let record = Record {
            id: id.clone(),
            parent,
            timestamp,
            message: message.to_string(),
            checksum: Checksum::of(content.as_bytes()),
        };

        let objects = self.file_dir(filename).join(OBJECTS_DIR);
        fs::create_dir_all(&objects)?;
        write_atomic(&objects.join(&id), content.as_bytes())?;

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let index_path = self.file_dir(filename).join(INDEX_FILE);
        append_record(&index_path, line.as_bytes(), File::sync_all)?;

        Ok(record.to_entry())
    }

    fn entries(&self, filename: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .records(filename)?
            .iter()
            .rev()
            .take(limit)
            .map(Record::to_entry)
            .collect())
    }

    fn snapshot(&self, filename: &str, id: &str) -> Result<Option<Snapshot>> {
        if id.len() < MIN_PREFIX_LEN || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Ok(None);
        }
        let id = id.to_ascii_lowercase();

        let records = self.records(filename)?;
        let mut matches = records.iter().filter(|r| r.id.starts_with(&id));
        let record = match (matches.next(), matches.next()) {
            (Some(record), None) => record,
            (Some(_), Some(_)) => {
                warn!(filename, id = %id, "ambiguous version prefix");
                return Ok(None);
            }
            _ => return Ok(None),
        };

        let content = self.load_object(filename, record)?;
        Ok(Some(Snapshot {
            entry: record.to_entry(),
            content,
        }))
    }
}
