mod message;

pub use message::{ChatMessage, MessageListPage, SendMessagePayload, ToolCall};
