//! Layered YAML configuration
//!
//! Looked up in order: an explicit path, `./podrecon.yaml`, then
//! `<user config dir>/podrecon/config.yaml`. Every field has a default, so a
//! missing file is not an error.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use miette::Diagnostic;
use thiserror::Error;

use crate::core::export::CustomerProfile;
use crate::core::ingest::DEFAULT_MAX_FILE_SIZE;
use crate::core::repository::DEFAULT_MAX_TEXT_LEN;

/// File name looked for in the working directory
pub const LOCAL_CONFIG_FILE: &str = "podrecon.yaml";

/// Default editor session length
pub const DEFAULT_SESSION_MINUTES: i64 = 30;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    #[diagnostic(
        code(podrecon::config::not_found),
        help("check the --config path, or drop the flag to use ./podrecon.yaml")
    )]
    NotFound { path: PathBuf },

    #[error("failed to read config file {}", path.display())]
    #[diagnostic(code(podrecon::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config in {}: {message}", path.display())]
    #[diagnostic(
        code(podrecon::config::invalid),
        help("every key is optional; see README.md for the layout")
    )]
    Yaml { path: PathBuf, message: String },
}

/// Upload and text limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest accepted upload, in bytes
    pub max_file_size: u64,

    /// Cap on sanitised repository text fields, in characters
    pub max_description_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_description_length: DEFAULT_MAX_TEXT_LEN,
        }
    }
}

/// Repository editor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Hex SHA-256 of the editor password; editing is disabled when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_sha256: Option<String>,

    /// How long an edit token stays valid
    pub session_minutes: i64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            password_sha256: None,
            session_minutes: DEFAULT_SESSION_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ship-to customer written on every order header
    pub customer: CustomerProfile,

    pub limits: Limits,

    /// Default repository JSON used when `--repo` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<PathBuf>,

    pub editor: EditorConfig,
}

impl Config {
    /// Resolve and load configuration
    ///
    /// An explicit path must exist; the implicit locations are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            return Self::from_file(path);
        }

        match Self::candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::from_file(&path),
            None => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a single YAML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&contents).map_err(|message| ConfigError::Yaml {
            path: path.to_path_buf(),
            message,
        })?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    fn from_yaml(contents: &str) -> Result<Self, String> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(contents).map_err(|e| e.to_string())
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dirs) = ProjectDirs::from("", "", "podrecon") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }
        paths
    }

    /// Editor session length as a duration
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.editor.session_minutes.max(1))
    }
}
