//! Configuration management for the edit store
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (edit-store.toml)
//! - Environment variables (EDIT_STORE__*)
//!
//! ## Example config file (edit-store.toml):
//! ```toml
//! [store]
//! data_dir = "./data"
//! backend = "git"
//! history_limit = 20
//! author_name = "Edit Store"
//! author_email = "edit-store@localhost"
//! allow_unknown_extensions = false
//!
//! [server]
//! host = "0.0.0.0"
//! port = 3002
//! cors = true
//! ```

use std::path::PathBuf;

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_LIMIT;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Snapshot log implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogBackend {
    /// Commits in a git repository at the data directory
    #[default]
    Git,
    /// Self-contained log under `.history/`
    File,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the managed files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub backend: LogBackend,

    /// Entries returned by a history listing
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Commit author (git backend)
    #[serde(default = "default_author_name")]
    pub author_name: String,

    #[serde(default = "default_author_email")]
    pub author_email: String,

    /// Serve files whose extension has no known format, without validation
    #[serde(default)]
    pub allow_unknown_extensions: bool,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow cross-origin requests from any origin
    #[serde(default = "default_true")]
    pub cors: bool,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_author_name() -> String {
    "Edit Store".to_string()
}

fn default_author_email() -> String {
    "edit-store@localhost".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3002
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: LogBackend::default(),
            history_limit: default_history_limit(),
            author_name: default_author_name(),
            author_email: default_author_email(),
            allow_unknown_extensions: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: true,
        }
    }
}

impl StoreConfig {
    /// Store config rooted at `data_dir`, other values default
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Get the data directory (resolves relative paths)
    pub fn data_dir(&self) -> PathBuf {
        if self.data_dir.is_absolute() {
            self.data_dir.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.data_dir)
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl EditorConfig {
    /// Load configuration from the default locations, then `config_path`
    /// if given, then `EDIT_STORE__*` environment variables
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "edit-store.toml",
            ".edit-store.toml",
            "config/edit-store.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(dirs) = directories::ProjectDirs::from("dev", "edit-store", "edit-store") {
            let xdg_config = dirs.config_dir().join("edit-store.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // EDIT_STORE__STORE__DATA_DIR, EDIT_STORE__SERVER__PORT, ...
        builder = builder.add_source(
            Environment::with_prefix("EDIT_STORE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.store.backend, LogBackend::Git);
        assert_eq!(config.store.history_limit, 20);
        assert!(!config.store.allow_unknown_extensions);
        assert_eq!(config.server.bind_addr(), "0.0.0.0:3002");
    }

    #[test]
    fn test_serialize_config() {
        let config = EditorConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("backend = \"git\""));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let path = path.to_str().unwrap();

        let mut config = EditorConfig::default();
        config.store.backend = LogBackend::File;
        config.store.history_limit = 5;
        config.server.port = 4000;
        config.save(path).unwrap();

        let loaded = EditorConfig::load_from(Some(path)).unwrap();
        assert_eq!(loaded.store.backend, LogBackend::File);
        assert_eq!(loaded.store.history_limit, 5);
        assert_eq!(loaded.server.port, 4000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let loaded = EditorConfig::load_from(path.to_str()).unwrap();
        assert_eq!(loaded.server.port, 8080);
        assert_eq!(loaded.store.author_name, "Edit Store");
    }
}
