//! WebSocket stream connection and frame schema.
//!
//! A single socket delivers the typed stream events that drive partial
//! messages and history reconciliation. The client sends no stream frames;
//! the session rides on a cookie credential attached at handshake time.

pub mod client;
pub mod messages;

pub use client::{ConnectionStatus, StreamConfig, StreamConnection, WsError};
pub use messages::{decode_frame, StreamContent, StreamEvent};
