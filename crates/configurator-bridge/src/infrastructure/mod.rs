//! Infrastructure layer for configurator-bridge.
//!
//! Handles all I/O: the WebSocket embedding boundary, the console streams,
//! image files, and the TOML config file.
//!
//! # What does NOT belong here?
//!
//! - Held state and command shaping (`configurator-core`)
//! - Console command semantics (the application layer)

pub mod console_io;
pub mod image_reader;
pub mod storage;
pub mod ws_server;

pub use console_io::run_console;
pub use ws_server::PeerBroadcaster;
