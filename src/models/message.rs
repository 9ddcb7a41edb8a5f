use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tool invocation streamed or stored alongside a message.
///
/// `arguments` is a JSON string built up by concatenation while streaming;
/// it is only guaranteed to parse once the generation has ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// A message persisted by the backend.
///
/// Immutable once received, except that the local cache may splice in an
/// optimistic copy (marked `pending`) before server confirmation.
///
/// The backend serializes the thought list as `reasoning` and the creation
/// time as `send_at`; both spellings are accepted on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub uuid: String,
    pub chat_uuid: String,
    pub sender_uuid: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "reasoning")]
    pub thoughts: Vec<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub meta_data: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "Utc::now", alias = "send_at")]
    pub created_at: DateTime<Utc>,
    /// True for a locally-constructed optimistic copy awaiting confirmation.
    #[serde(skip)]
    pub pending: bool,
}

impl ChatMessage {
    /// Build a locally-constructed optimistic message for a just-sent text.
    pub fn optimistic(chat_uuid: &str, sender_uuid: &str, text: &str) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            chat_uuid: chat_uuid.to_string(),
            sender_uuid: sender_uuid.to_string(),
            text: text.to_string(),
            thoughts: Vec::new(),
            tool_calls: Vec::new(),
            meta_data: serde_json::Map::new(),
            created_at: Utc::now(),
            pending: true,
        }
    }
}

/// One page of message history, newest-first, as returned by
/// `GET /api/v1/chats/:uuid/messages/list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageListPage {
    #[serde(default)]
    pub rows: Vec<ChatMessage>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// Request body for `POST /api/v1/chats/:uuid/messages/send`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessagePayload {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_accepts_backend_spellings() {
        let json = r#"{
            "uuid": "m1",
            "chat_uuid": "c1",
            "sender_uuid": "msgmate",
            "text": "hi",
            "reasoning": ["step one"],
            "send_at": "2026-01-05T12:00:00Z"
        }"#;

        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.thoughts, vec!["step one".to_string()]);
        assert_eq!(msg.created_at.to_rfc3339(), "2026-01-05T12:00:00+00:00");
        assert!(!msg.pending);
    }

    #[test]
    fn test_chat_message_defaults_for_missing_fields() {
        let json = r#"{"uuid": "m2", "chat_uuid": "c1", "sender_uuid": "u1"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert!(msg.text.is_empty());
        assert!(msg.thoughts.is_empty());
        assert!(msg.tool_calls.is_empty());
        assert!(msg.meta_data.is_empty());
    }

    #[test]
    fn test_optimistic_message_has_unique_uuid() {
        let a = ChatMessage::optimistic("c1", "u1", "hello");
        let b = ChatMessage::optimistic("c1", "u1", "hello");
        assert_ne!(a.uuid, b.uuid);
        assert!(a.pending);
    }

    #[test]
    fn test_message_list_page_decodes_rows() {
        let json = r#"{
            "rows": [
                {"uuid": "m2", "chat_uuid": "c1", "sender_uuid": "u1", "text": "two"},
                {"uuid": "m1", "chat_uuid": "c1", "sender_uuid": "u1", "text": "one"}
            ],
            "page": 1,
            "total_count": 2
        }"#;
        let page: MessageListPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0].uuid, "m2");
        assert_eq!(page.total_count, Some(2));
    }
}
