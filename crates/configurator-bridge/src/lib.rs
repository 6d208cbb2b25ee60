//! configurator-bridge library crate.
//!
//! Hosts the harness side of the configurator embedding protocol.  The page
//! that embeds the configurator relays window messages to this process over
//! a WebSocket; the operator drives the configurator from a console.
//!
//! # Architecture
//!
//! ```text
//! Embedding page (JSON envelopes over WebSocket)
//!         ↕
//! [configurator-bridge]
//!   ├── domain/           BridgeConfig
//!   ├── application/
//!   │     ├── hub/        process-wide message delivery + scoped subscriptions
//!   │     ├── session/    Harness: state, forms, dispatcher, mount/unmount
//!   │     └── console/    console command parsing, execution, rendering
//!   └── infrastructure/
//!         ├── ws_server/  WebSocket accept loop + peer fan-out (tokio-tungstenite)
//!         ├── console_io/ stdin/stdout loop
//!         ├── image_reader/ file → data URL
//!         └── storage/    TOML config file
//! ```
//!
//! # Layer rules
//!
//! - `domain` holds plain configuration types.
//! - `application` orchestrates in-process work; the only I/O it reaches is
//!   the image file read, through `infrastructure::image_reader`.
//! - `infrastructure` owns sockets, stdin/stdout, and the file system.

/// Domain layer: runtime configuration.
pub mod domain;

/// Application layer: message hub, harness session, console.
pub mod application;

/// Infrastructure layer: WebSocket server, console I/O, files.
pub mod infrastructure;
