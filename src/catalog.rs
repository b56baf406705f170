//! Enumerates managed files in the data directory

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;
use crate::format::is_allowed;

/// Read-only view over the top level of a data directory
#[derive(Debug, Clone)]
pub struct FileCatalog {
    root: PathBuf,
}

impl FileCatalog {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Regular files with an allow-listed extension. Hidden entries
    /// (history log, temp files) are never listed.
    pub fn list(&self) -> Result<BTreeSet<String>> {
        let mut files = BTreeSet::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !name.starts_with('.') && is_allowed(name) {
                files.insert(name.to_string());
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_lists_allowed_extensions_only() {
        let dir = tempdir().unwrap();
        for name in ["a.json", "b.yaml", "c.yml", "d.xml", "e.txt", "f", ".g.json"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.json")).unwrap();
        fs::write(dir.path().join("nested.json").join("inner.json"), "{}").unwrap();

        let files = FileCatalog::new(dir.path()).list().unwrap();
        let names: Vec<_> = files.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["a.json", "b.yaml", "c.yml", "d.xml"]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempdir().unwrap();
        assert!(FileCatalog::new(dir.path()).list().unwrap().is_empty());
    }
}
