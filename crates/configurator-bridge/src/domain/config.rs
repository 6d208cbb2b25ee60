//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for runtime settings.  It
//! is assembled once at startup from CLI arguments, the optional TOML file,
//! and these defaults, then shared read-only.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use configurator_core::DispatchOptions;

/// Default WebSocket port the embedding page connects to.
pub const DEFAULT_WS_PORT: u16 = 24900;

/// Default number of outbound frames buffered per connected page.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// All runtime configuration for the bridge.
///
/// # Example
///
/// ```rust
/// use configurator_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.ws_bind_addr.port(), 24900);
/// assert!(cfg.dispatch.ignore_conflicts);
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address the WebSocket server binds to.
    ///
    /// Defaults to loopback: the embedding page normally runs on the same
    /// machine, and no sender-origin checks are performed on inbound frames.
    pub ws_bind_addr: SocketAddr,

    /// Send `triggerConfigurationUpdated` to each page as soon as it
    /// connects, so the harness receives the current configuration.
    pub trigger_on_connect: bool,

    /// Outbound frames buffered per page before a slow page starts losing
    /// them.
    pub outbound_capacity: usize,

    /// Flags attached to requirement updates.
    pub dispatch: DispatchOptions,
}

impl Default for BridgeConfig {
    /// | Field              | Default            |
    /// |--------------------|--------------------|
    /// | ws_bind_addr       | `127.0.0.1:24900`  |
    /// | trigger_on_connect | `true`             |
    /// | outbound_capacity  | 256                |
    /// | dispatch           | ignore conflicts, include searchbar results |
    fn default() -> Self {
        Self {
            ws_bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_WS_PORT),
            trigger_on_connect: true,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            dispatch: DispatchOptions::default(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
