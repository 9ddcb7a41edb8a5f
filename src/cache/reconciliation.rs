//! Reconciliation of transient rows with their persisted counterparts.
//!
//! Called from the frame router on `new_message`: the sentinel placeholder
//! and any optimistic duplicate are removed in the same step that inserts
//! the server-confirmed row, so the view never observes both at once.

use tracing::debug;

use crate::models::ChatMessage;

use super::{MessageCache, PARTIAL_MESSAGE_UUID};

impl MessageCache {
    /// Fold a server-confirmed message into the chat's rows.
    ///
    /// Removes any `partial_message` placeholder rows, then either updates
    /// the existing row with the same uuid in place (a re-delivered frame
    /// must not duplicate it) or supersedes a matching optimistic row and
    /// inserts the incoming message at the head.
    pub fn reconcile(&mut self, chat_uuid: &str, incoming: ChatMessage) {
        let history = self.chats.entry(chat_uuid.to_string()).or_default();

        history.rows.retain(|r| r.uuid != PARTIAL_MESSAGE_UUID);

        if let Some(existing) = history.rows.iter_mut().find(|r| r.uuid == incoming.uuid) {
            debug!(uuid = %incoming.uuid, "Re-reconciling already-known message");
            *existing = incoming;
            return;
        }

        // Best-effort content match against an optimistic local send that
        // the server has now confirmed under its own uuid.
        if let Some(pos) = history.rows.iter().position(|r| {
            r.pending && r.sender_uuid == incoming.sender_uuid && r.text == incoming.text
        }) {
            debug!(uuid = %incoming.uuid, "Superseding optimistic row");
            history.rows.remove(pos);
        }

        history.rows.insert(0, incoming);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageListPage;

    fn msg(uuid: &str, sender: &str, text: &str) -> ChatMessage {
        ChatMessage {
            uuid: uuid.to_string(),
            chat_uuid: "c1".to_string(),
            sender_uuid: sender.to_string(),
            text: text.to_string(),
            thoughts: Vec::new(),
            tool_calls: Vec::new(),
            meta_data: serde_json::Map::new(),
            created_at: chrono::Utc::now(),
            pending: false,
        }
    }

    #[test]
    fn test_reconcile_inserts_at_head() {
        let mut cache = MessageCache::new();
        cache.set_rows(
            "c1",
            MessageListPage {
                rows: vec![msg("m1", "u1", "old")],
                page: 1,
                total_count: None,
            },
        );

        cache.reconcile("c1", msg("m2", "msgmate", "reply"));

        let rows = cache.rows("c1").unwrap();
        assert_eq!(rows[0].uuid, "m2");
        assert_eq!(rows[1].uuid, "m1");
    }

    #[test]
    fn test_reconcile_is_idempotent_per_uuid() {
        let mut cache = MessageCache::new();
        cache.reconcile("c1", msg("m9", "msgmate", "Hello"));
        cache.reconcile("c1", msg("m9", "msgmate", "Hello"));

        let matching = cache
            .rows("c1")
            .unwrap()
            .iter()
            .filter(|r| r.uuid == "m9")
            .count();
        assert_eq!(matching, 1);
    }

    #[test]
    fn test_reconcile_removes_placeholder_rows() {
        let mut cache = MessageCache::new();
        cache.set_rows(
            "c1",
            MessageListPage {
                rows: vec![msg(PARTIAL_MESSAGE_UUID, "msgmate", "Hel"), msg("m1", "u1", "hi")],
                page: 1,
                total_count: None,
            },
        );

        cache.reconcile("c1", msg("m9", "msgmate", "Hello"));

        let rows = cache.rows("c1").unwrap();
        assert!(rows.iter().all(|r| r.uuid != PARTIAL_MESSAGE_UUID));
        assert_eq!(rows[0].uuid, "m9");
    }

    #[test]
    fn test_reconcile_supersedes_optimistic_send() {
        let mut cache = MessageCache::new();
        let client_uuid = cache.optimistic_insert("c1", "u1", "my message");

        let mut confirmed = msg("m5", "u1", "my message");
        confirmed.pending = false;
        cache.reconcile("c1", confirmed);

        let rows = cache.rows("c1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].uuid, "m5");
        assert!(rows.iter().all(|r| r.uuid != client_uuid));
    }

    #[test]
    fn test_reconcile_leaves_unrelated_optimistic_rows() {
        let mut cache = MessageCache::new();
        let other_uuid = cache.optimistic_insert("c1", "u1", "still pending");

        cache.reconcile("c1", msg("m5", "msgmate", "a bot reply"));

        let rows = cache.rows("c1").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.uuid == other_uuid && r.pending));
    }

    #[test]
    fn test_reconcile_into_unloaded_chat_creates_history() {
        let mut cache = MessageCache::new();
        cache.reconcile("c-new", msg("m1", "msgmate", "hi"));

        assert_eq!(cache.rows("c-new").unwrap().len(), 1);
    }
}
