//! Root client state.
//!
//! [`ClientState`] owns the partial-message store and the history cache and
//! is passed by reference to the consumers that need it. All mutation
//! happens on one logical thread, in frame receipt order or in response to
//! local user actions; no locking is involved.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::MessageCache;
use crate::partial::PartialMessageStore;
use crate::websocket::{ConnectionStatus, StreamConfig};

/// How long to keep an accumulator alive after `end_partial_message` while
/// waiting for the matching `new_message`. Past this, the generation is
/// assumed lost and the accumulator is cleared so the UI does not show a
/// stuck "generating" indicator.
pub const HANDOFF_TIMEOUT_SECS: u64 = 10;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// HTTP(S) base URL of the backend.
    pub base_url: String,
    /// Session cookie attached to requests and the socket handshake.
    pub cookie: Option<String>,
    /// Page size for history fetches.
    pub page_size: u32,
    /// End-to-persisted handoff timeout.
    pub handoff_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1984".to_string(),
            cookie: None,
            page_size: 10,
            handoff_timeout: Duration::from_secs(HANDOFF_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Derive the stream connection configuration.
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            base_url: self.base_url.clone(),
            cookie: self.cookie.clone(),
            ..StreamConfig::default()
        }
    }
}

/// Owned root of all client-side chat state.
#[derive(Debug)]
pub struct ClientState {
    /// In-flight generations, one accumulator per chat.
    pub partials: PartialMessageStore,
    /// Persisted message history per chat.
    pub cache: MessageCache,
    /// Connection status mirrored from the stream socket for the UI.
    pub connection: ConnectionStatus,
    /// Last failed send, surfaced as a toast-style indicator.
    pub last_send_error: Option<String>,
    /// Chats whose stream ended but whose persisted copy has not arrived,
    /// with the instant the `end_partial_message` was observed.
    pub(crate) pending_handoffs: HashMap<String, Instant>,
    pub(crate) handoff_timeout: Duration,
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientState {
    pub fn new() -> Self {
        Self::with_handoff_timeout(Duration::from_secs(HANDOFF_TIMEOUT_SECS))
    }

    pub fn with_handoff_timeout(handoff_timeout: Duration) -> Self {
        Self {
            partials: PartialMessageStore::new(),
            cache: MessageCache::new(),
            connection: ConnectionStatus::Disconnected,
            last_send_error: None,
            pending_handoffs: HashMap::new(),
            handoff_timeout,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_handoff_timeout(config.handoff_timeout)
    }

    /// True while a generation is streaming or awaiting its persisted copy.
    /// Drives the cancel affordance: cancel disables itself until the
    /// stream concludes, it never truncates locally.
    pub fn is_generating(&self, chat_uuid: &str) -> bool {
        self.partials.is_streaming(chat_uuid) || self.pending_handoffs.contains_key(chat_uuid)
    }

    pub fn set_connection(&mut self, status: ConnectionStatus) {
        self.connection = status;
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.connection, ConnectionStatus::Connected)
    }

    /// Reset transient stream state after the socket resumed.
    ///
    /// A reconnect must not resurrect accumulators from before the
    /// disconnect; any generation still running server-side will announce
    /// itself again with a fresh `start_partial_message`.
    pub fn on_reconnected(&mut self) {
        self.partials.clear();
        self.pending_handoffs.clear();
        self.connection = ConnectionStatus::Connected;
    }
}
