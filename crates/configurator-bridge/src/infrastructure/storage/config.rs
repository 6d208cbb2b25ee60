//! TOML configuration file for the bridge.
//!
//! The file is optional.  Every key has a serde default, so a partial file
//! (or none at all) still yields a complete [`FileConfig`]:
//!
//! ```toml
//! [bridge]
//! ws_bind = "127.0.0.1"
//! ws_port = 24900
//! trigger_on_connect = true
//!
//! [commands]
//! ignore_conflicts = true
//! include_searchbar_results = true
//!
//! [logging]
//! level = "info"
//! ```
//!
//! CLI arguments override whatever the file says; see `main.rs`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::{DEFAULT_OUTBOUND_CAPACITY, DEFAULT_WS_PORT};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default)]
    pub bridge: BridgeSection,
    #[serde(default)]
    pub commands: CommandsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[bridge]`: where the embedding page connects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeSection {
    #[serde(default = "default_ws_bind")]
    pub ws_bind: String,

    #[serde(default = "default_ws_port")]
    pub ws_port: u16,

    #[serde(default = "default_true")]
    pub trigger_on_connect: bool,

    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
}

/// `[commands]`: fixed flags sent with requirement updates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandsSection {
    #[serde(default = "default_true")]
    pub ignore_conflicts: bool,

    #[serde(default = "default_true")]
    pub include_searchbar_results: bool,
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default value functions ───────────────────────────────────────────────────

fn default_ws_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_ws_port() -> u16 {
    DEFAULT_WS_PORT
}
fn default_true() -> bool {
    true
}
fn default_outbound_capacity() -> usize {
    DEFAULT_OUTBOUND_CAPACITY
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            ws_bind: default_ws_bind(),
            ws_port: default_ws_port(),
            trigger_on_connect: true,
            outbound_capacity: default_outbound_capacity(),
        }
    }
}

impl Default for CommandsSection {
    fn default() -> Self {
        Self {
            ignore_conflicts: true,
            include_searchbar_results: true,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Loads the config file at `path`.
///
/// Unlike a platform config directory, an explicitly named file must exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parses config file contents.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<FileConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
