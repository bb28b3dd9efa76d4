//! WebSocket transport task for the MindMate relay.
//!
//! The task owns the socket and nothing else: it connects when commanded,
//! serializes outbound messages, validates inbound frames, and reports
//! lifecycle changes as typed [`RelayEvent`]s. Reconnect *policy* (when to
//! try again) lives in the session controller; this task only ever makes an
//! attempt when told to.

use futures_util::{SinkExt, StreamExt};
use mindmate_core::protocol::{self, InboundMessage, OutboundMessage};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message as WsMessage,
};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Transport configuration. `wss://` URLs negotiate TLS through the crate's
/// `native-tls` (default) or `rustls` feature.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub url: String,
}

/// Commands from the runtime to the transport task.
#[derive(Debug)]
pub enum RelayCommand {
    /// Open a connection to the configured endpoint.
    Connect,
    /// Serialize and send one message on the current connection. Dropped
    /// with a warning when no connection is up (no durability guarantee).
    Send(OutboundMessage),
    /// Close the connection, if any, and end the task.
    Shutdown,
}

/// Transport lifecycle and traffic events delivered to the runtime.
#[derive(Debug)]
pub enum RelayEvent {
    /// A connection attempt succeeded.
    Opened,
    /// The connection closed or an attempt failed.
    Closed { reason: Option<String> },
    /// A validated reply frame arrived.
    Frame(InboundMessage),
}

/// Why the connected phase of the task ended.
enum Ended {
    /// The socket closed or errored; carry the reason for the status line.
    Socket(Option<String>),
    /// The runtime asked the task to stop.
    Shutdown,
}

/// Spawns the transport task for the given endpoint.
///
/// Returns the command sender, the event receiver, and the task handle. The
/// task ends on [`RelayCommand::Shutdown`] or when either channel side is
/// dropped.
pub fn spawn(
    config: RelayConfig,
) -> (
    mpsc::Sender<RelayCommand>,
    mpsc::Receiver<RelayEvent>,
    JoinHandle<()>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(128);
    let (event_tx, event_rx) = mpsc::channel(128);
    let handle = tokio::spawn(run(config, cmd_rx, event_tx));
    (cmd_tx, event_rx, handle)
}

async fn run(
    config: RelayConfig,
    mut cmd_rx: mpsc::Receiver<RelayCommand>,
    event_tx: mpsc::Sender<RelayEvent>,
) {
    loop {
        // Disconnected: wait for a Connect command.
        let stream = loop {
            match cmd_rx.recv().await {
                Some(RelayCommand::Connect) => match connect_async(config.url.as_str()).await {
                    Ok((stream, _)) => break stream,
                    Err(e) => {
                        debug!(url = %config.url, error = %e, "relay connection attempt failed");
                        if event_tx
                            .send(RelayEvent::Closed {
                                reason: Some(e.to_string()),
                            })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                },
                Some(RelayCommand::Send(msg)) => {
                    warn!(id = msg.id(), "dropping outbound message, relay not connected");
                }
                Some(RelayCommand::Shutdown) | None => return,
            }
        };

        info!(url = %config.url, "connected to relay");
        if event_tx.send(RelayEvent::Opened).await.is_err() {
            return;
        }

        match drive(stream, &mut cmd_rx, &event_tx).await {
            Ended::Socket(reason) => {
                if event_tx.send(RelayEvent::Closed { reason }).await.is_err() {
                    return;
                }
            }
            Ended::Shutdown => return,
        }
    }
}

/// Proxies traffic on an established connection until it ends.
async fn drive(
    mut stream: WsStream,
    cmd_rx: &mut mpsc::Receiver<RelayCommand>,
    event_tx: &mpsc::Sender<RelayEvent>,
) -> Ended {
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(RelayCommand::Send(msg)) => {
                    let payload = match serde_json::to_string(&msg) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(error = %e, "failed to serialize outbound message");
                            continue;
                        }
                    };
                    if let Err(e) = stream.send(WsMessage::Text(payload)).await {
                        return Ended::Socket(Some(e.to_string()));
                    }
                }
                Some(RelayCommand::Connect) => {
                    debug!("ignoring connect command, already connected");
                }
                Some(RelayCommand::Shutdown) => {
                    let _ = stream.close(None).await;
                    return Ended::Shutdown;
                }
                None => {
                    let _ = stream.close(None).await;
                    return Ended::Shutdown;
                }
            },
            msg = stream.next() => match msg {
                Some(Ok(WsMessage::Text(text))) => match protocol::parse_frame(&text) {
                    Ok(frame) => {
                        if event_tx.send(RelayEvent::Frame(frame)).await.is_err() {
                            return Ended::Shutdown;
                        }
                    }
                    Err(e) => warn!(error = %e, "dropping malformed relay frame"),
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    return Ended::Socket(frame.map(|f| f.reason.to_string()));
                }
                Some(Ok(WsMessage::Binary(_))) => {
                    warn!("ignoring unexpected binary frame from relay");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Ended::Socket(Some(e.to_string())),
                None => return Ended::Socket(None),
            },
        }
    }
}
