//! Configurator harness bridge: entry point.
//!
//! Listens for the page that embeds the configurator on a WebSocket, holds
//! what the configurator publishes, and gives the operator a console to send
//! commands back.
//!
//! # Usage
//!
//! ```text
//! configurator-bridge [OPTIONS]
//!
//! Options:
//!   --ws-bind <ADDR>   WebSocket bind address [default: 127.0.0.1]
//!   --ws-port <PORT>   WebSocket listener port [default: 24900]
//!   --config  <FILE>   TOML config file
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable          | Default     | Description             |
//! |-------------------|-------------|-------------------------|
//! | `HARNESS_WS_BIND` | `127.0.0.1` | WebSocket bind address  |
//! | `HARNESS_WS_PORT` | `24900`     | WebSocket listener port |
//! | `HARNESS_CONFIG`  | (none)      | TOML config file        |
//! | `RUST_LOG`        | `info`      | Log filter              |
//!
//! CLI arguments win over environment variables, which win over the config
//! file, which wins over built-in defaults.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use configurator_bridge::application::{Harness, MessageHub};
use configurator_bridge::domain::BridgeConfig;
use configurator_bridge::infrastructure::storage::{load_config, FileConfig};
use configurator_bridge::infrastructure::ws_server::{bind, serve};
use configurator_bridge::infrastructure::{run_console, PeerBroadcaster};
use configurator_core::DispatchOptions;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Host harness for an embedded product configurator.
#[derive(Debug, Parser)]
#[command(
    name = "configurator-bridge",
    about = "WebSocket host harness and console for an embedded product configurator",
    version
)]
struct Cli {
    /// IP address to bind the WebSocket server to.
    #[arg(long, env = "HARNESS_WS_BIND")]
    ws_bind: Option<String>,

    /// TCP port for the WebSocket server.
    #[arg(long, env = "HARNESS_WS_PORT")]
    ws_port: Option<u16>,

    /// Optional TOML config file.
    #[arg(long, env = "HARNESS_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Reads the config file named by `--config`, or the defaults.
    fn file_config(&self) -> anyhow::Result<FileConfig> {
        match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config file {}", path.display())),
            None => Ok(FileConfig::default()),
        }
    }

    /// Merges the CLI arguments over `file` into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address is not a valid IP address.
    fn into_bridge_config(self, file: &FileConfig) -> anyhow::Result<BridgeConfig> {
        let ws_bind = self.ws_bind.unwrap_or_else(|| file.bridge.ws_bind.clone());
        let ws_port = self.ws_port.unwrap_or(file.bridge.ws_port);

        let ip: IpAddr = ws_bind
            .parse()
            .with_context(|| format!("invalid WebSocket bind address: '{ws_bind}'"))?;

        Ok(BridgeConfig {
            ws_bind_addr: SocketAddr::new(ip, ws_port),
            trigger_on_connect: file.bridge.trigger_on_connect,
            outbound_capacity: file.bridge.outbound_capacity,
            dispatch: DispatchOptions {
                ignore_conflicts: file.commands.ignore_conflicts,
                include_searchbar_results: file.commands.include_searchbar_results,
            },
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Step 1: Parse CLI arguments and read the config file ─────────────────
    let cli = Cli::parse();
    let file = cli.file_config()?;

    // ── Step 2: Initialise structured logging ────────────────────────────────
    // RUST_LOG wins; otherwise the config file's level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&file.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Step 3: Merge CLI over file over defaults ────────────────────────────
    let config = cli.into_bridge_config(&file)?;
    info!(
        "configurator bridge starting, ws={}, trigger_on_connect={}",
        config.ws_bind_addr, config.trigger_on_connect
    );

    // ── Step 4: Bind the embedding boundary and start accepting pages ────────
    // Bind errors must fail startup, before anything is mounted.
    let listener = bind(config.ws_bind_addr).await?;
    let hub = MessageHub::new();
    let peers = PeerBroadcaster::new(config.outbound_capacity);
    let running = Arc::new(AtomicBool::new(true));

    let server = tokio::spawn(serve(
        listener,
        hub.clone(),
        peers.clone(),
        Arc::new(config.clone()),
        Arc::clone(&running),
    ));

    // ── Step 5: Mount the harness (subscribe, then trigger) ──────────────────
    let mut harness = Harness::new(peers, config.dispatch);
    harness.mount(&hub).await?;

    // ── Step 6: Run the console until `quit`, EOF, or Ctrl+C ────────────────
    tokio::select! {
        result = run_console(&mut harness, BufReader::new(tokio::io::stdin()), tokio::io::stdout()) => {
            if let Err(e) = result {
                warn!("console stopped: {e:#}");
            }
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("received Ctrl+C, shutting down"),
                Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
            }
        }
    }

    // ── Step 7: Unmount and stop the accept loop ─────────────────────────────
    harness.unmount();
    running.store(false, Ordering::Relaxed);
    server.await.context("server task panicked")??;

    info!("configurator bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
