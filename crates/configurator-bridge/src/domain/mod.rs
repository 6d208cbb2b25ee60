//! Domain layer for configurator-bridge.
//!
//! Plain configuration types with no I/O.  The infrastructure layer (and
//! `main.rs`) is responsible for populating them from CLI arguments,
//! environment variables, and the config file.

pub mod config;

pub use config::BridgeConfig;
