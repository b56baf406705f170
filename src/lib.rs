//! Edit Store
//!
//! A version-controlled store for structured documents (JSON, YAML, XML)
//! backing a browser-based editor.
//!
//! ## Features
//!
//! - **Append-only History**: every save and restore is one immutable entry
//! - **Syntax Validation**: content must be well-formed for its extension
//! - **Lazy Creation**: reading a missing file creates a starter document
//! - **Pluggable Logs**: git commits or a self-contained snapshot log
//! - **HTTP API**: a small axum router for the editor front end
//!
//! ## Architecture
//!
//! ```text
//! HTTP (server) ──► FileStore ──► validate / template
//!                      │
//!                      ├──► FileCatalog   (list managed files)
//!                      └──► SnapshotLog   (GitLog | FileLog)
//! ```

mod atomic;

pub mod catalog;
pub mod checksum;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod log;
pub mod server;
pub mod store;
pub mod template;
pub mod validate;

pub use catalog::FileCatalog;
pub use checksum::Checksum;
pub use config::{EditorConfig, LogBackend, ServerConfig, StoreConfig};
pub use error::{Result, StoreError, ValidationError};
pub use format::FormatKind;
pub use history::HistoryEntry;
pub use log::{FileLog, GitLog, Snapshot, SnapshotLog};
pub use store::{FileStore, ReadOutcome, Restored, StoreOptions};
pub use validate::validate;
