//! WebSocket stream connection.
//!
//! Owns exactly one socket per client session. Frames are decoded on the
//! read task and forwarded over an mpsc channel so all store mutation stays
//! on the consumer's single logical thread. The connection reconnects with
//! bounded backoff; consumers watch [`ConnectionStatus`] and must treat a
//! resumed connection as a fresh stream (see
//! [`crate::state::ClientState::on_reconnected`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::messages::{decode_frame, StreamEvent};

/// Path of the stream endpoint on the backend.
const STREAM_PATH: &str = "/ws/connect";

/// Channel capacity for decoded frames awaiting the consumer.
const INCOMING_BUFFER: usize = 256;

/// WebSocket connection errors.
#[derive(Debug, Clone)]
pub enum WsError {
    ConnectionFailed(String),
    ParseError(String),
    InvalidUrl(String),
}

impl std::fmt::Display for WsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WsError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            WsError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            WsError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
        }
    }
}

impl std::error::Error for WsError {}

/// Connection status surfaced to the UI as a status indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Reconnecting { attempt: u8 },
    Disconnected,
}

/// Configuration for the stream connection.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// HTTP(S) base URL of the backend; the socket scheme mirrors it
    /// (`ws` for `http`, `wss` for `https`).
    pub base_url: String,
    /// Session cookie attached to the handshake, if any. The backend
    /// expects no handshake payload beyond the cookie credential.
    pub cookie: Option<String>,
    pub max_retries: u8,
    pub max_backoff_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1984".to_string(),
            cookie: None,
            max_retries: 5,
            max_backoff_secs: 30,
        }
    }
}

impl StreamConfig {
    /// Derive the socket URL from the HTTP base URL.
    pub fn stream_url(&self) -> Result<String, WsError> {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return Err(WsError::InvalidUrl(format!(
                "expected http(s) base url, got {}",
                self.base_url
            )));
        };
        Ok(format!("{}{}", ws_base.trim_end_matches('/'), STREAM_PATH))
    }
}

/// Handle to the single stream socket.
///
/// Dropping the connection signals the background task to stop.
pub struct StreamConnection {
    incoming_rx: mpsc::Receiver<StreamEvent>,
    state_rx: watch::Receiver<ConnectionStatus>,
    shutdown: Arc<AtomicBool>,
}

impl StreamConnection {
    /// Connect to the backend stream endpoint.
    pub async fn connect(config: StreamConfig) -> Result<Self, WsError> {
        let url = config.stream_url()?;
        let request = build_request(&url, config.cookie.as_deref())?;

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        info!("Connected to stream socket at {}", url);

        let (incoming_tx, incoming_rx) = mpsc::channel::<StreamEvent>(INCOMING_BUFFER);
        let (state_tx, state_rx) = watch::channel(ConnectionStatus::Connected);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_task = shutdown.clone();

        tokio::spawn(async move {
            run_connection_loop(url, config, ws_stream, incoming_tx, state_tx, shutdown_task)
                .await;
        });

        Ok(Self {
            incoming_rx,
            state_rx,
            shutdown,
        })
    }

    /// Receive the next decoded frame. Returns `None` once the connection
    /// has shut down and the channel drained.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.incoming_rx.recv().await
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.state_rx.borrow(), ConnectionStatus::Connected)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to connection status changes.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionStatus> {
        self.state_rx.clone()
    }

    /// Signal the background task to stop.
    pub fn shutdown(&self) {
        info!("Shutting down stream connection");
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn build_request(
    url: &str,
    cookie: Option<&str>,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, WsError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| WsError::InvalidUrl(e.to_string()))?;
    if let Some(cookie) = cookie {
        let value = cookie
            .parse()
            .map_err(|_| WsError::InvalidUrl("invalid cookie value".to_string()))?;
        request.headers_mut().insert(COOKIE, value);
    }
    Ok(request)
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Background loop: read frames, decode, forward; reconnect on failure.
async fn run_connection_loop(
    url: String,
    config: StreamConfig,
    mut ws_stream: WsStream,
    incoming_tx: mpsc::Sender<StreamEvent>,
    state_tx: watch::Sender<ConnectionStatus>,
    shutdown: Arc<AtomicBool>,
) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            let _ = ws_stream.close(None).await;
            break;
        }

        match read_until_closed(&mut ws_stream, &incoming_tx, &shutdown).await {
            ReadOutcome::Shutdown => {
                let _ = ws_stream.close(None).await;
                break;
            }
            ReadOutcome::ConsumerGone => break,
            ReadOutcome::SocketClosed => {
                warn!("Stream socket closed, attempting to reconnect");
                match reconnect(&url, &config, &state_tx, &shutdown).await {
                    Some(stream) => {
                        ws_stream = stream;
                        let _ = state_tx.send(ConnectionStatus::Connected);
                        info!("Stream socket reconnected");
                    }
                    None => break,
                }
            }
        }
    }

    let _ = state_tx.send(ConnectionStatus::Disconnected);
    debug!("Stream connection loop finished");
}

enum ReadOutcome {
    SocketClosed,
    ConsumerGone,
    Shutdown,
}

async fn read_until_closed(
    ws_stream: &mut WsStream,
    incoming_tx: &mpsc::Sender<StreamEvent>,
    shutdown: &Arc<AtomicBool>,
) -> ReadOutcome {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return ReadOutcome::Shutdown;
        }

        let message = tokio::select! {
            msg = ws_stream.next() => msg,
            _ = tokio::time::sleep(Duration::from_millis(500)) => continue,
        };

        match message {
            Some(Ok(Message::Text(raw))) => match decode_frame(&raw) {
                Ok(StreamEvent::Unknown) => {
                    debug!("Ignoring unhandled frame type");
                }
                Ok(event) => {
                    if incoming_tx.send(event).await.is_err() {
                        return ReadOutcome::ConsumerGone;
                    }
                }
                // One bad frame must not affect the frames around it.
                Err(e) => warn!("Dropping malformed frame: {}", e),
            },
            Some(Ok(Message::Ping(payload))) => {
                let _ = ws_stream.send(Message::Pong(payload)).await;
            }
            Some(Ok(Message::Close(_))) | None => return ReadOutcome::SocketClosed,
            Some(Ok(_)) => {
                // Binary/pong frames carry nothing for this protocol.
            }
            Some(Err(e)) => {
                warn!("Stream socket error: {}", e);
                return ReadOutcome::SocketClosed;
            }
        }
    }
}

/// Try to re-establish the socket with exponential backoff. Returns `None`
/// when retries are exhausted or shutdown was requested.
async fn reconnect(
    url: &str,
    config: &StreamConfig,
    state_tx: &watch::Sender<ConnectionStatus>,
    shutdown: &Arc<AtomicBool>,
) -> Option<WsStream> {
    for attempt in 1..=config.max_retries {
        if shutdown.load(Ordering::SeqCst) {
            return None;
        }

        let _ = state_tx.send(ConnectionStatus::Reconnecting { attempt });
        let backoff = Duration::from_secs(2u64.pow(attempt as u32).min(config.max_backoff_secs));
        debug!("Reconnect attempt {} in {:?}", attempt, backoff);
        tokio::time::sleep(backoff).await;

        let request = match build_request(url, config.cookie.as_deref()) {
            Ok(req) => req,
            Err(e) => {
                warn!("Cannot rebuild handshake request: {}", e);
                return None;
            }
        };

        match connect_async(request).await {
            Ok((stream, _)) => return Some(stream),
            Err(e) => warn!("Reconnect attempt {} failed: {}", attempt, e),
        }
    }

    warn!("Giving up after {} reconnect attempts", config.max_retries);
    None
}
