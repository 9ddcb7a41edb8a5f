//! msgmate-client - streaming chat client core for a msgmate backend
//!
//! This library implements the client side of the msgmate real-time message
//! stream: it accumulates incremental token/thought/tool-call frames into
//! per-chat partial messages and reconciles them against the paginated
//! message history once a generation completes.

pub mod adapters;
pub mod api;
pub mod cache;
pub mod error;
pub mod models;
pub mod partial;
pub mod prelude;
pub mod router;
pub mod state;
pub mod traits;
pub mod view;
pub mod websocket;
