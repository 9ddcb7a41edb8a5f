//! Convenient imports for library consumers.
//!
//! ```ignore
//! use msgmate_client::prelude::*;
//! ```

pub use crate::api::ChatApi;
pub use crate::cache::{MessageCache, PARTIAL_MESSAGE_UUID};
pub use crate::error::{ClientError, ClientResult};
pub use crate::models::{ChatMessage, MessageListPage, ToolCall};
pub use crate::partial::{PartialDelta, PartialMessage, PartialMessageStore};
pub use crate::state::{ClientConfig, ClientState};
pub use crate::view::{ScrollState, TimelineEntry};
pub use crate::websocket::{
    ConnectionStatus, StreamConfig, StreamConnection, StreamContent, StreamEvent,
};
