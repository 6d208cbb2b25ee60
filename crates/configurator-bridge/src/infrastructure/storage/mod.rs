//! Persistent settings for the bridge.

pub mod config;

pub use config::{load_config, ConfigError, FileConfig};
