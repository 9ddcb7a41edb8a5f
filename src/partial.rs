//! Per-chat accumulators for in-flight streamed messages.
//!
//! A [`PartialMessage`] holds the text, thoughts and tool calls of a
//! generation that is still streaming. The store is a pure state container:
//! it performs no I/O and is only mutated by the frame router and by the
//! reconnect handling in [`crate::state::ClientState`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::ToolCall;

/// An in-progress, not-yet-persisted message being streamed token-by-token.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PartialMessage {
    /// Accumulated text, grows only by append.
    pub text: String,
    /// Ordered reasoning steps; each index may itself grow by append.
    pub thoughts: Vec<String>,
    /// Tool calls keyed by name; arguments concatenate across frames.
    pub tool_calls: Vec<ToolCall>,
    /// Diagnostic fields (timing, token usage), last write wins.
    pub meta_data: serde_json::Map<String, serde_json::Value>,
}

/// A partial patch carried by a `new_partial_message` frame.
///
/// Absent fields leave the corresponding accumulator field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PartialDelta {
    pub text: Option<String>,
    pub thoughts: Option<Vec<String>>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub meta_data: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Keyed mapping from chat uuid to the chat's in-flight accumulator.
///
/// At most one accumulator exists per chat at any time. Accumulators never
/// survive the generation they represent: a successor `start` overwrites any
/// residue rather than merging with it.
#[derive(Debug, Default)]
pub struct PartialMessageStore {
    messages: HashMap<String, PartialMessage>,
}

impl PartialMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh accumulator for `chat_uuid`, overwriting any prior
    /// entry. Overwriting guards against orphaned state from a previous
    /// stream that never ended cleanly.
    pub fn start(&mut self, chat_uuid: &str) {
        self.messages
            .insert(chat_uuid.to_string(), PartialMessage::default());
    }

    /// Apply a delta to the chat's accumulator.
    ///
    /// If `append` arrives before `start` (or after `remove`), a fresh empty
    /// accumulator is substituted, so the call never fails.
    pub fn append(&mut self, chat_uuid: &str, delta: PartialDelta) {
        let current = self.messages.entry(chat_uuid.to_string()).or_default();

        if let Some(text) = delta.text {
            current.text.push_str(&text);
        }

        if let Some(thoughts) = delta.thoughts {
            for (index, fragment) in thoughts.into_iter().enumerate() {
                match current.thoughts.get_mut(index) {
                    // Existing indices extend in place.
                    Some(existing) => existing.push_str(&fragment),
                    // Indices beyond the current length start new thoughts.
                    None => current.thoughts.push(fragment),
                }
            }
        }

        if let Some(tool_calls) = delta.tool_calls {
            for call in tool_calls {
                // Matched by name, not call id: the backend contract allows
                // at most one in-flight call per distinct tool name.
                match current.tool_calls.iter_mut().find(|c| c.name == call.name) {
                    Some(existing) => existing.arguments.push_str(&call.arguments),
                    None => current.tool_calls.push(call),
                }
            }
        }

        if let Some(meta_data) = delta.meta_data {
            current.meta_data = meta_data;
        }
    }

    /// Delete the chat's accumulator. No-op if absent.
    pub fn remove(&mut self, chat_uuid: &str) {
        self.messages.remove(chat_uuid);
    }

    /// Current accumulator for the chat, if a generation is in flight.
    pub fn get(&self, chat_uuid: &str) -> Option<&PartialMessage> {
        self.messages.get(chat_uuid)
    }

    /// Clone of the current accumulator, for consumers that must hold a
    /// snapshot across further mutation.
    pub fn snapshot(&self, chat_uuid: &str) -> Option<PartialMessage> {
        self.messages.get(chat_uuid).cloned()
    }

    pub fn is_streaming(&self, chat_uuid: &str) -> bool {
        self.messages.contains_key(chat_uuid)
    }

    /// Drop every accumulator. Used after a reconnect, where continuity of
    /// any in-flight stream cannot be assumed.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
