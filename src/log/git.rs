//! Git-backed snapshot log

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use git2::{Commit, ErrorCode, Oid, Repository, Signature, Sort, Tree};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{Snapshot, SnapshotLog};
use crate::error::{Result, StoreError};
use crate::history::HistoryEntry;

/// Trailer naming the file a commit belongs to
const FILE_TRAILER: &str = "Edit-File: ";

/// One commit per entry in a repository whose work tree is the data directory
pub struct GitLog {
    /// All files share HEAD, so commits are serialized across files
    repo: Mutex<Repository>,
    /// `.git` directory; lookups open their own handle and never wait on commits
    git_dir: PathBuf,
    author_name: String,
    author_email: String,
}

impl GitLog {
    /// Open the repository at `root`, initializing one if needed
    pub fn open(root: &Path, author_name: &str, author_email: &str) -> Result<Self> {
        let repo = match Repository::open(root) {
            Ok(repo) => repo,
            Err(_) => {
                debug!(path = %root.display(), "initializing git repository");
                Repository::init(root)?
            }
        };

        Ok(Self {
            git_dir: repo.path().to_path_buf(),
            repo: Mutex::new(repo),
            author_name: author_name.to_string(),
            author_email: author_email.to_string(),
        })
    }

    /// Read-only handle. HEAD moves by atomic ref update, so a lookup sees
    /// either the state before a commit or after it.
    fn reader(&self) -> Result<Repository> {
        Ok(Repository::open(&self.git_dir)?)
    }

    fn commit_file(
        &self,
        repo: &Repository,
        filename: &str,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<Oid> {
        let mut index = repo.index()?;
        index.add_path(Path::new(filename))?;
        let tree_oid = index.write_tree()?;
        let tree = repo.find_tree(tree_oid)?;

        let time = git2::Time::new(at.timestamp(), 0);
        let sig = Signature::new(&self.author_name, &self.author_email, &time)?;
        let full_message = format!("{}\n\n{}{}", message, FILE_TRAILER, filename);

        let parent_commit = head_commit(repo)?;
        let parents: Vec<&Commit> = parent_commit.iter().collect();

        let oid = repo.commit(Some("HEAD"), &sig, &sig, &full_message, &tree, &parents)?;

        // The commit is already durable; a stale on-disk index only affects
        // `git status` and is rewritten on the next commit.
        if let Err(e) = index.write() {
            warn!(error = %e, "failed to write git index");
        }
        Ok(oid)
    }
}

impl SnapshotLog for GitLog {
    fn name(&self) -> &'static str {
        "git"
    }

    fn append(
        &self,
        filename: &str,
        _content: &str,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<HistoryEntry> {
        let repo = self.repo.lock();
        match self.commit_file(&repo, filename, message, at) {
            Ok(oid) => Ok(HistoryEntry::new(oid.to_string(), at, message)),
            Err(e) => {
                // Drop whatever was staged in memory for this attempt
                if let Ok(mut index) = repo.index() {
                    let _ = index.read(true);
                }
                Err(e)
            }
        }
    }

    fn entries(&self, filename: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let repo = self.reader()?;
        if head_commit(&repo)?.is_none() {
            return Ok(Vec::new());
        }

        let mut walk = repo.revwalk()?;
        walk.push_head()?;
        // Time order is produced lazily, so the walk stops at `limit`
        walk.set_sorting(Sort::TIME)?;

        let mut history = Vec::new();
        for oid in walk {
            let commit = repo.find_commit(oid?)?;
            if belongs_to(&commit, filename)? {
                history.push(entry_from(&commit));
                if history.len() >= limit {
                    break;
                }
            }
        }
        Ok(history)
    }

    fn snapshot(&self, filename: &str, id: &str) -> Result<Option<Snapshot>> {
        let repo = self.reader()?;
        let commit = match repo.revparse_single(id).and_then(|obj| obj.peel_to_commit()) {
            Ok(commit) => commit,
            Err(_) => return Ok(None),
        };
        if !belongs_to(&commit, filename)? {
            return Ok(None);
        }
        let Some(blob_oid) = blob_id(&commit.tree()?, filename) else {
            return Ok(None);
        };

        let blob = repo.find_blob(blob_oid)?;
        let content = String::from_utf8(blob.content().to_vec()).map_err(|_| {
            StoreError::Corrupt(format!("{} at {} is not valid UTF-8", filename, commit.id()))
        })?;

        Ok(Some(Snapshot {
            entry: entry_from(&commit),
            content,
        }))
    }
}

/// Get the HEAD commit, or `None` on an unborn branch
fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_commit()?)),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn blob_id(tree: &Tree<'_>, filename: &str) -> Option<Oid> {
    tree.get_path(Path::new(filename)).ok().map(|entry| entry.id())
}

fn trailer(message: &str) -> Option<&str> {
    message
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(FILE_TRAILER))
        .map(str::trim)
}

/// Commits made by this log carry a trailer. Foreign commits count when
/// they change the file relative to their first parent.
fn belongs_to(commit: &Commit<'_>, filename: &str) -> Result<bool> {
    if let Some(marked) = trailer(commit.message().unwrap_or_default()) {
        return Ok(marked == filename);
    }

    let Some(blob) = blob_id(&commit.tree()?, filename) else {
        return Ok(false);
    };
    let parent_blob = match commit.parent(0) {
        Ok(parent) => blob_id(&parent.tree()?, filename),
        Err(_) => None,
    };
    Ok(parent_blob != Some(blob))
}

fn entry_from(commit: &Commit<'_>) -> HistoryEntry {
    let at = DateTime::from_timestamp(commit.time().seconds(), 0).unwrap_or_default();
    HistoryEntry::new(commit.id().to_string(), at, commit.summary().unwrap_or_default())
}
