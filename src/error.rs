//! Error types for the edit store

use thiserror::Error;

use crate::format::FormatKind;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Content failed the well-formedness check for its format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid {kind} format: {detail}")]
    Syntax { kind: FormatKind, detail: String },
}

impl ValidationError {
    pub fn syntax(kind: FormatKind, detail: impl ToString) -> Self {
        Self::Syntax {
            kind,
            detail: detail.to_string(),
        }
    }
}

/// Edit store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Version {entry} not found for {filename}")]
    NotFound { filename: String, entry: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("Corrupt history: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Failed to replace file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl StoreError {
    pub fn not_found(filename: &str, entry: &str) -> Self {
        Self::NotFound {
            filename: filename.to_string(),
            entry: entry.to_string(),
        }
    }

    /// Content was rejected; nothing was written
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The referenced file, format or history entry could not be resolved
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UnsupportedFormat(_))
    }

    /// The backing directory or version log failed
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Corrupt(_) | Self::Io(_) | Self::Json(_) | Self::Git(_) | Self::Persist(_)
        )
    }
}
