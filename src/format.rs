//! Document formats and filename rules

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Syntax family of a managed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Json,
    Yaml,
    Xml,
}

impl FormatKind {
    /// Resolve the format from a filename's extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?;
        EXTENSIONS
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, kind)| *kind)
    }
}

/// Extensions the store manages and the format each one selects
const EXTENSIONS: &[(&str, FormatKind)] = &[
    ("json", FormatKind::Json),
    ("yaml", FormatKind::Yaml),
    ("yml", FormatKind::Yaml),
    ("xml", FormatKind::Xml),
];

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatKind::Json => "JSON",
            FormatKind::Yaml => "YAML",
            FormatKind::Xml => "XML",
        };
        f.write_str(name)
    }
}

/// Whether a filename carries one of the allow-listed extensions
pub fn is_allowed(filename: &str) -> bool {
    FormatKind::from_filename(filename).is_some()
}

/// Reject anything that is not a single visible path component.
///
/// Names starting with `.` are reserved for the history log and temp files.
pub fn check_filename(filename: &str) -> Result<()> {
    let bad = filename.is_empty()
        || filename.starts_with('.')
        || filename.contains(['/', '\\', '\0'])
        || filename.len() > 255;
    if bad {
        return Err(StoreError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}
