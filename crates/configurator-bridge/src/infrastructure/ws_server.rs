//! WebSocket server: the embedding boundary.
//!
//! The page that embeds the configurator connects here and relays window
//! messages in both directions as JSON text frames:
//!
//! - **Page → harness**: every text frame is decoded and handed to the
//!   [`MessageHub`].  Frames that are not JSON are delivered as a JSON string
//!   so they still reach the message log.
//! - **Harness → page**: envelopes sent through [`PeerBroadcaster`] are
//!   written to every connected page.
//!
//! No sender-origin checks are performed; bind to loopback unless the page
//! runs elsewhere.
//!
//! Each page session runs in its own Tokio task.  The accept loop checks the
//! shared `running` flag every 200 ms and exits once it is cleared.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use configurator_core::{Command, CommandSender, Envelope, SendError};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::hub::MessageHub;
use crate::domain::config::BridgeConfig;

// ── Outbound fan-out ──────────────────────────────────────────────────────────

/// [`CommandSender`] that writes each envelope to every connected page.
#[derive(Clone)]
pub struct PeerBroadcaster {
    tx: broadcast::Sender<String>,
}

impl PeerBroadcaster {
    /// `capacity` frames are buffered per page before a slow page starts
    /// missing them.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Number of pages currently receiving outbound frames.
    pub fn peer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl CommandSender for PeerBroadcaster {
    async fn send(&self, envelope: Envelope) -> Result<(), SendError> {
        let frame =
            serde_json::to_string(&envelope).map_err(|e| SendError::Encode(e.to_string()))?;
        match self.tx.send(frame) {
            Ok(peers) => debug!("{} sent to {peers} page(s)", envelope.name),
            Err(_) => warn!("no embedding page connected; {} not delivered", envelope.name),
        }
        Ok(())
    }
}

/// Turns one inbound text frame into a message payload.
pub fn decode_frame(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

// ── Accept loop ───────────────────────────────────────────────────────────────

/// Binds the WebSocket listener.
///
/// # Errors
///
/// Returns an error if the address is in use or cannot be bound.
pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {addr}"))?;
    info!("embedding boundary listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accepts page connections on `listener` until `running` is cleared.
///
/// Each accepted connection is handed to its own task; a failed session
/// never stops the loop.
///
/// # Parameters
///
/// - `listener` – Bound listener from [`bind`].
/// - `hub`      – Receives every decoded inbound frame.
/// - `peers`    – Outbound fan-out; each session subscribes to it.
/// - `config`   – Bridge configuration (`trigger_on_connect`).
/// - `running`  – Shared flag; checked every 200 ms, the loop exits when it
///   is set to `false`.
///
/// # Errors
///
/// Currently always returns `Ok`; accept failures are logged and skipped.
pub async fn serve(
    listener: TcpListener,
    hub: MessageHub,
    peers: PeerBroadcaster,
    config: Arc<BridgeConfig>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("new page connection from {peer_addr}");
                let hub = hub.clone();
                let peers = peers.clone();
                let cfg = Arc::clone(&config);
                tokio::spawn(async move {
                    handle_page_session(stream, peer_addr, hub, peers, cfg).await;
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_page_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    hub: MessageHub,
    peers: PeerBroadcaster,
    config: Arc<BridgeConfig>,
) {
    match run_session(raw_stream, peer_addr, hub, peers, config).await {
        Ok(()) => info!("session {peer_addr} closed normally"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

/// Runs one page session until either direction stops.
///
/// # Parameters
///
/// - `raw_stream` – Accepted TCP stream, before the WebSocket handshake.
/// - `peer_addr`  – Remote address, used in log messages.
/// - `hub`        – Receives every inbound text frame, decoded.
/// - `peers`      – Source of outbound frames for this page.
/// - `config`     – Decides whether a trigger is sent on connect.
///
/// # Errors
///
/// Returns an error if the handshake fails or the connect-time trigger
/// cannot be written.  Errors after that end the session quietly.
async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    hub: MessageHub,
    peers: PeerBroadcaster,
    config: Arc<BridgeConfig>,
) -> anyhow::Result<()> {
    // ── Step 1: Complete the WebSocket handshake ───────────────────────────────
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let session_id = Uuid::new_v4();
    info!("WebSocket session {session_id} established with {peer_addr}");

    // ── Step 2: Split the stream and join the outbound fan-out ────────────────
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // Must be subscribed before the trigger is sent.
    let mut outbound = peers.subscribe();

    // ── Step 3: Request the page's current configuration ──────────────────────
    if config.trigger_on_connect {
        let trigger = serde_json::to_string(&Command::TriggerConfigurationUpdated.to_envelope())
            .context("failed to encode trigger envelope")?;
        ws_tx
            .send(WsMessage::Text(trigger))
            .await
            .with_context(|| format!("session {session_id}: failed to send trigger"))?;
        debug!("session {session_id}: sent triggerConfigurationUpdated");
    }

    // ── Step 4: Relay both directions ─────────────────────────────────────────
    // Harness → page.
    let harness_to_page = async {
        loop {
            match outbound.recv().await {
                Ok(frame) => {
                    if ws_tx.send(WsMessage::Text(frame)).await.is_err() {
                        debug!("session {session_id}: WebSocket send failed (page disconnected)");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("session {session_id}: page fell behind, {missed} frame(s) dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    // Page → harness.
    let page_to_harness = async {
        loop {
            let ws_msg = match ws_rx.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                    debug!("session {session_id}: page WebSocket closed");
                    break;
                }
                Some(Err(e)) => {
                    warn!("session {session_id}: page WebSocket error: {e}");
                    break;
                }
                None => {
                    debug!("session {session_id}: page stream ended");
                    break;
                }
            };

            match ws_msg {
                WsMessage::Text(text) => {
                    let payload = decode_frame(&text);
                    debug!(
                        "session {session_id}: page → harness: {}",
                        Envelope::name_of(&payload).unwrap_or("(unnamed)")
                    );
                    hub.deliver(payload);
                }
                WsMessage::Binary(_) => {
                    warn!("session {session_id}: ignoring binary frame");
                }
                WsMessage::Close(_) => {
                    debug!("session {session_id}: page sent Close frame");
                    break;
                }
                _ => {}
            }
        }
    };

    // ── Step 5: Wait for either direction to finish ───────────────────────────
    tokio::select! {
        () = harness_to_page => debug!("session {session_id}: outbound direction finished"),
        () = page_to_harness => debug!("session {session_id}: inbound direction finished"),
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_frame_parses_json() {
        let payload = decode_frame(r#"{"name":"elfsquad.configurationUpdated","args":{"id":"c"}}"#);
        assert_eq!(
            payload,
            json!({"name": "elfsquad.configurationUpdated", "args": {"id": "c"}})
        );
    }

    #[test]
    fn test_decode_frame_keeps_non_json_as_string() {
        assert_eq!(decode_frame("hello"), json!("hello"));
    }

    #[tokio::test]
    async fn test_broadcaster_without_peers_still_succeeds() {
        let peers = PeerBroadcaster::new(4);
        let result = peers
            .send(Command::TriggerConfigurationUpdated.to_envelope())
            .await;
        assert!(result.is_ok());
        assert_eq!(peers.peer_count(), 0);
    }

    #[tokio::test]
    async fn test_broadcaster_writes_envelope_json_to_each_peer() {
        // Arrange
        let peers = PeerBroadcaster::new(4);
        let mut a = peers.subscribe();
        let mut b = peers.subscribe();

        // Act
        peers
            .send(Envelope::new("elfsquad.updateTextValue", json!({"nodeId": "t"})))
            .await
            .unwrap();

        // Assert
        for rx in [&mut a, &mut b] {
            let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(
                frame,
                json!({"name": "elfsquad.updateTextValue", "args": {"nodeId": "t"}})
            );
        }
    }

    #[tokio::test]
    async fn test_bind_port_zero_picks_free_port() {
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_serve_exits_when_flag_cleared() {
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let running = Arc::new(AtomicBool::new(false));

        let result = serve(
            listener,
            MessageHub::new(),
            PeerBroadcaster::new(4),
            Arc::new(BridgeConfig::default()),
            running,
        )
        .await;

        assert!(result.is_ok());
    }
}
