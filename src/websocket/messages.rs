//! Frame schema for the msgmate stream socket.
//!
//! The backend delivers JSON frames of shape `{type, content}` on a single
//! WebSocket. The four recognized types drive the partial-message lifecycle;
//! anything else decodes to [`StreamEvent::Unknown`] and is ignored.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{ChatMessage, ToolCall};
use crate::partial::PartialDelta;

use super::client::WsError;

/// An inbound frame, classified by its `type` tag.
///
/// For a given chat the backend guarantees `end_partial_message` precedes
/// the corresponding `new_message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "content")]
pub enum StreamEvent {
    /// A generation began; create a fresh accumulator.
    #[serde(rename = "start_partial_message")]
    StartPartialMessage(StreamContent),
    /// A delta for the in-flight generation.
    #[serde(rename = "new_partial_message")]
    NewPartialMessage(StreamContent),
    /// The generation finished streaming. The accumulator is NOT cleared
    /// here; the handoff completes on the following `new_message`.
    #[serde(rename = "end_partial_message")]
    EndPartialMessage(StreamContent),
    /// The persisted copy of a completed message.
    #[serde(rename = "new_message")]
    NewMessage(StreamContent),
    /// Any frame type this client does not handle (presence updates etc.).
    #[serde(other, deserialize_with = "ignore_content")]
    Unknown,
}

/// Consume and discard whatever `content` accompanies an unrecognized frame
/// type; `#[serde(other)]` alone rejects non-unit payloads under adjacent
/// tagging.
fn ignore_content<'de, D: Deserializer<'de>>(d: D) -> Result<(), D::Error> {
    serde::de::IgnoredAny::deserialize(d).map(|_| ())
}

impl StreamEvent {
    /// The chat this frame belongs to, if it carries one.
    pub fn chat_uuid(&self) -> Option<&str> {
        match self {
            StreamEvent::StartPartialMessage(c)
            | StreamEvent::NewPartialMessage(c)
            | StreamEvent::EndPartialMessage(c)
            | StreamEvent::NewMessage(c) => Some(c.chat_uuid.as_str()),
            StreamEvent::Unknown => None,
        }
    }
}

/// Payload shared by all stream frame kinds; fields beyond `chat_uuid` are
/// present only where the frame kind calls for them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamContent {
    pub chat_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, alias = "reasoning", skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl StreamContent {
    /// The delta fields of a `new_partial_message` payload.
    pub fn into_delta(self) -> PartialDelta {
        PartialDelta {
            text: self.text,
            thoughts: self.thoughts,
            tool_calls: self.tool_calls,
            meta_data: self.meta_data,
        }
    }

    /// Build the persisted message carried by a `new_message` payload.
    ///
    /// Returns `None` when the frame lacks a server-assigned uuid; such a
    /// frame cannot be reconciled and is dropped by the router.
    pub fn into_message(self) -> Option<ChatMessage> {
        let uuid = self.uuid?;
        Some(ChatMessage {
            uuid,
            chat_uuid: self.chat_uuid,
            sender_uuid: self.sender_uuid.unwrap_or_default(),
            text: self.text.unwrap_or_default(),
            thoughts: self.thoughts.unwrap_or_default(),
            tool_calls: self.tool_calls.unwrap_or_default(),
            meta_data: self.meta_data.unwrap_or_default(),
            created_at: Utc::now(),
            pending: false,
        })
    }
}

/// Decode a raw text frame into a [`StreamEvent`].
pub fn decode_frame(raw: &str) -> Result<StreamEvent, WsError> {
    serde_json::from_str(raw).map_err(|e| WsError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_start_partial_message() {
        let json = r#"{
            "type": "start_partial_message",
            "content": {"chat_uuid": "c1", "sender_uuid": "msgmate"}
        }"#;

        match decode_frame(json).unwrap() {
            StreamEvent::StartPartialMessage(content) => {
                assert_eq!(content.chat_uuid, "c1");
                assert_eq!(content.sender_uuid.as_deref(), Some("msgmate"));
            }
            other => panic!("expected StartPartialMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_new_partial_message_with_delta_fields() {
        let json = r#"{
            "type": "new_partial_message",
            "content": {
                "chat_uuid": "c1",
                "text": "tok",
                "reasoning": ["thinking"],
                "tool_calls": [{"name": "search", "arguments": "{"}]
            }
        }"#;

        match decode_frame(json).unwrap() {
            StreamEvent::NewPartialMessage(content) => {
                let delta = content.into_delta();
                assert_eq!(delta.text.as_deref(), Some("tok"));
                assert_eq!(delta.thoughts, Some(vec!["thinking".to_string()]));
                assert_eq!(delta.tool_calls.unwrap()[0].name, "search");
            }
            other => panic!("expected NewPartialMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_new_message_into_chat_message() {
        let json = r#"{
            "type": "new_message",
            "content": {
                "chat_uuid": "c1",
                "sender_uuid": "msgmate",
                "uuid": "m9",
                "text": "Hello"
            }
        }"#;

        match decode_frame(json).unwrap() {
            StreamEvent::NewMessage(content) => {
                let msg = content.into_message().unwrap();
                assert_eq!(msg.uuid, "m9");
                assert_eq!(msg.text, "Hello");
                assert!(!msg.pending);
            }
            other => panic!("expected NewMessage, got {:?}", other),
        }
    }

    #[test]
    fn test_new_message_without_uuid_yields_none() {
        let content = StreamContent {
            chat_uuid: "c1".into(),
            text: Some("orphan".into()),
            ..Default::default()
        };
        assert!(content.into_message().is_none());
    }

    #[test]
    fn test_unrecognized_type_decodes_to_unknown() {
        let json = r#"{
            "type": "user_went_online",
            "content": {"user_uuid": "u1"}
        }"#;

        assert_eq!(decode_frame(json).unwrap(), StreamEvent::Unknown);
    }

    #[test]
    fn test_malformed_frame_is_a_parse_error() {
        assert!(decode_frame("not json").is_err());
        assert!(decode_frame(r#"{"content": {"chat_uuid": "c1"}}"#).is_err());
    }
}
