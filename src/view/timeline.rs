//! Merged chronological view of a chat.
//!
//! Combines the cached history (stored newest-first, reversed here to
//! chronological order) with the live accumulator as a synthetic trailing
//! entry. Recomputed whenever either source changes; entries borrow from
//! the state, nothing is cloned.

use crate::models::ChatMessage;
use crate::partial::PartialMessage;
use crate::state::ClientState;

/// One displayable row of a chat.
#[derive(Debug, PartialEq)]
pub enum TimelineEntry<'a> {
    /// A persisted (or optimistic) message from the history cache.
    Persisted(&'a ChatMessage),
    /// The currently generating message.
    Streaming(&'a PartialMessage),
}

impl ClientState {
    /// The list to display for a chat, oldest first, with the in-flight
    /// accumulator (if any) appended last.
    ///
    /// The accumulator stays visible through the window between
    /// `end_partial_message` and `new_message`, so a finishing generation
    /// never flashes out of view.
    pub fn timeline(&self, chat_uuid: &str) -> Vec<TimelineEntry<'_>> {
        let mut entries: Vec<TimelineEntry<'_>> = self
            .cache
            .rows(chat_uuid)
            .unwrap_or_default()
            .iter()
            .rev()
            .map(TimelineEntry::Persisted)
            .collect();

        if let Some(partial) = self.partials.get(chat_uuid) {
            entries.push(TimelineEntry::Streaming(partial));
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_rows(state: &mut ClientState, chat: &str, uuids: &[&str]) {
        // set_rows expects newest-first, like the backend delivers.
        let rows = uuids
            .iter()
            .map(|uuid| ChatMessage {
                uuid: uuid.to_string(),
                chat_uuid: chat.to_string(),
                sender_uuid: "u1".to_string(),
                text: format!("text-{uuid}"),
                thoughts: Vec::new(),
                tool_calls: Vec::new(),
                meta_data: serde_json::Map::new(),
                created_at: chrono::Utc::now(),
                pending: false,
            })
            .collect();
        state.cache.set_rows(
            chat,
            crate::models::MessageListPage {
                rows,
                page: 1,
                total_count: None,
            },
        );
    }

    #[test]
    fn test_timeline_reverses_to_chronological_order() {
        let mut state = ClientState::new();
        seed_rows(&mut state, "c1", &["m3", "m2", "m1"]);

        let timeline = state.timeline("c1");
        let uuids: Vec<&str> = timeline
            .iter()
            .map(|e| match e {
                TimelineEntry::Persisted(m) => m.uuid.as_str(),
                TimelineEntry::Streaming(_) => "streaming",
            })
            .collect();
        assert_eq!(uuids, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_streaming_entry_trails_the_history() {
        let mut state = ClientState::new();
        seed_rows(&mut state, "c1", &["m1"]);
        state.apply_raw_frame(
            r#"{"type": "start_partial_message", "content": {"chat_uuid": "c1"}}"#,
        );
        state.apply_raw_frame(
            r#"{"type": "new_partial_message", "content": {"chat_uuid": "c1", "text": "typing"}}"#,
        );

        let timeline = state.timeline("c1");
        assert_eq!(timeline.len(), 2);
        match &timeline[1] {
            TimelineEntry::Streaming(partial) => assert_eq!(partial.text, "typing"),
            other => panic!("expected trailing streaming entry, got {:?}", other),
        }
    }

    #[test]
    fn test_streaming_entry_survives_until_persisted_copy() {
        let mut state = ClientState::new();
        state.apply_raw_frame(
            r#"{"type": "start_partial_message", "content": {"chat_uuid": "c1"}}"#,
        );
        state.apply_raw_frame(
            r#"{"type": "new_partial_message", "content": {"chat_uuid": "c1", "text": "Hello"}}"#,
        );
        state.apply_raw_frame(
            r#"{"type": "end_partial_message", "content": {"chat_uuid": "c1"}}"#,
        );

        // After end, before new_message: still exactly one streaming entry.
        let timeline = state.timeline("c1");
        assert_eq!(timeline.len(), 1);
        assert!(matches!(timeline[0], TimelineEntry::Streaming(_)));

        state.apply_raw_frame(
            r#"{"type": "new_message", "content": {"chat_uuid": "c1", "uuid": "m9", "text": "Hello"}}"#,
        );

        // After new_message: one persisted entry, no streaming leftover.
        let timeline = state.timeline("c1");
        assert_eq!(timeline.len(), 1);
        match &timeline[0] {
            TimelineEntry::Persisted(m) => assert_eq!(m.uuid, "m9"),
            other => panic!("expected persisted entry, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_chat_yields_empty_timeline() {
        let state = ClientState::new();
        assert!(state.timeline("nowhere").is_empty());
    }
}
