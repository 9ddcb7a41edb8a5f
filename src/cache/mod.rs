//! Per-chat message history cache.
//!
//! Holds the authoritative, paginated, newest-first list of persisted
//! messages per chat, patched locally on send and on stream reconciliation.

mod reconciliation;

use std::collections::HashMap;

use tracing::debug;

use crate::models::{ChatMessage, MessageListPage};

/// Sentinel uuid some frontends use to represent the in-flight message
/// inline. Rows carrying it are purged during reconciliation; it is the one
/// uuid allowed to appear more than once.
pub const PARTIAL_MESSAGE_UUID: &str = "partial_message";

/// Cached history for one chat.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    /// Persisted messages, newest-first.
    pub(crate) rows: Vec<ChatMessage>,
    /// Highest page fetched so far (1-based; 0 = nothing loaded).
    pub(crate) page: u32,
    /// True while a refresh is in flight.
    pub(crate) loading: bool,
    /// Last load failure, kept alongside the last good rows.
    pub(crate) load_error: Option<String>,
}

/// Local cache of message history, keyed by chat uuid.
///
/// Rows are mutated only through the reconciliation path or by direct
/// user-send (optimistic insert/rollback).
#[derive(Debug, Default)]
pub struct MessageCache {
    pub(crate) chats: HashMap<String, ChatHistory>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows for a chat, newest-first. `None` if nothing has been loaded
    /// and no message has arrived for the chat.
    pub fn rows(&self, chat_uuid: &str) -> Option<&[ChatMessage]> {
        self.chats.get(chat_uuid).map(|h| h.rows.as_slice())
    }

    pub fn is_loading(&self, chat_uuid: &str) -> bool {
        self.chats.get(chat_uuid).is_some_and(|h| h.loading)
    }

    pub fn load_error(&self, chat_uuid: &str) -> Option<&str> {
        self.chats
            .get(chat_uuid)
            .and_then(|h| h.load_error.as_deref())
    }

    pub fn loaded_page(&self, chat_uuid: &str) -> u32 {
        self.chats.get(chat_uuid).map_or(0, |h| h.page)
    }

    pub fn set_loading(&mut self, chat_uuid: &str, loading: bool) {
        self.chats.entry(chat_uuid.to_string()).or_default().loading = loading;
    }

    /// Record a failed refresh. Existing rows are kept; the error is
    /// surfaced to the view layer alongside them.
    pub fn set_load_error(&mut self, chat_uuid: &str, error: String) {
        let history = self.chats.entry(chat_uuid.to_string()).or_default();
        history.loading = false;
        history.load_error = Some(error);
    }

    /// Replace the chat's rows with a freshly fetched first page.
    pub fn set_rows(&mut self, chat_uuid: &str, page: MessageListPage) {
        let history = self.chats.entry(chat_uuid.to_string()).or_default();
        history.rows = page.rows;
        history.page = page.page.max(1);
        history.loading = false;
        history.load_error = None;
    }

    /// Append an older page to the chat's rows, skipping uuids already
    /// present (a row may move pages between fetches).
    pub fn extend_rows(&mut self, chat_uuid: &str, page: MessageListPage) {
        let history = self.chats.entry(chat_uuid.to_string()).or_default();
        for row in page.rows {
            if history.rows.iter().any(|r| r.uuid == row.uuid) {
                debug!(uuid = %row.uuid, "Skipping duplicate row from page fetch");
                continue;
            }
            history.rows.push(row);
        }
        history.page = history.page.max(page.page);
        history.loading = false;
        history.load_error = None;
    }

    /// Splice a client-constructed message at the head before server
    /// confirmation. Returns the optimistic row's client-generated uuid,
    /// used for rollback if the send fails.
    pub fn optimistic_insert(&mut self, chat_uuid: &str, sender_uuid: &str, text: &str) -> String {
        let message = ChatMessage::optimistic(chat_uuid, sender_uuid, text);
        let uuid = message.uuid.clone();
        self.chats
            .entry(chat_uuid.to_string())
            .or_default()
            .rows
            .insert(0, message);
        uuid
    }

    /// Remove an optimistic row after a failed send. Returns true if a row
    /// was removed.
    pub fn rollback_optimistic(&mut self, chat_uuid: &str, client_uuid: &str) -> bool {
        let Some(history) = self.chats.get_mut(chat_uuid) else {
            return false;
        };
        let before = history.rows.len();
        history
            .rows
            .retain(|r| !(r.pending && r.uuid == client_uuid));
        history.rows.len() != before
    }

    pub fn contains_uuid(&self, chat_uuid: &str, uuid: &str) -> bool {
        self.chats
            .get(chat_uuid)
            .is_some_and(|h| h.rows.iter().any(|r| r.uuid == uuid))
    }

    /// Drop a chat's history entirely.
    pub fn remove_chat(&mut self, chat_uuid: &str) {
        self.chats.remove(chat_uuid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(uuid: &str, text: &str) -> ChatMessage {
        ChatMessage {
            uuid: uuid.to_string(),
            chat_uuid: "c1".to_string(),
            sender_uuid: "u1".to_string(),
            text: text.to_string(),
            thoughts: Vec::new(),
            tool_calls: Vec::new(),
            meta_data: serde_json::Map::new(),
            created_at: chrono::Utc::now(),
            pending: false,
        }
    }

    fn page(rows: Vec<ChatMessage>, page_no: u32) -> MessageListPage {
        MessageListPage {
            rows,
            page: page_no,
            total_count: None,
        }
    }

    #[test]
    fn test_set_rows_replaces_and_clears_flags() {
        let mut cache = MessageCache::new();
        cache.set_loading("c1", true);
        cache.set_rows("c1", page(vec![msg("m2", "two"), msg("m1", "one")], 1));

        assert_eq!(cache.rows("c1").unwrap().len(), 2);
        assert!(!cache.is_loading("c1"));
        assert!(cache.load_error("c1").is_none());
        assert_eq!(cache.loaded_page("c1"), 1);
    }

    #[test]
    fn test_extend_rows_appends_older_page_and_dedupes() {
        let mut cache = MessageCache::new();
        cache.set_rows("c1", page(vec![msg("m3", "three"), msg("m2", "two")], 1));
        cache.extend_rows("c1", page(vec![msg("m2", "two"), msg("m1", "one")], 2));

        let rows = cache.rows("c1").unwrap();
        assert_eq!(
            rows.iter().map(|r| r.uuid.as_str()).collect::<Vec<_>>(),
            vec!["m3", "m2", "m1"]
        );
        assert_eq!(cache.loaded_page("c1"), 2);
    }

    #[test]
    fn test_failed_load_keeps_last_good_rows() {
        let mut cache = MessageCache::new();
        cache.set_rows("c1", page(vec![msg("m1", "one")], 1));

        cache.set_loading("c1", true);
        cache.set_load_error("c1", "connection refused".to_string());

        assert_eq!(cache.rows("c1").unwrap().len(), 1);
        assert!(!cache.is_loading("c1"));
        assert_eq!(cache.load_error("c1"), Some("connection refused"));
    }

    #[test]
    fn test_optimistic_insert_goes_to_head() {
        let mut cache = MessageCache::new();
        cache.set_rows("c1", page(vec![msg("m1", "one")], 1));

        let client_uuid = cache.optimistic_insert("c1", "u1", "local send");

        let rows = cache.rows("c1").unwrap();
        assert_eq!(rows[0].uuid, client_uuid);
        assert!(rows[0].pending);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_rollback_removes_only_the_optimistic_row() {
        let mut cache = MessageCache::new();
        cache.set_rows("c1", page(vec![msg("m1", "one")], 1));
        let client_uuid = cache.optimistic_insert("c1", "u1", "will fail");

        assert!(cache.rollback_optimistic("c1", &client_uuid));
        assert!(!cache.rollback_optimistic("c1", &client_uuid));

        let rows = cache.rows("c1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].uuid, "m1");
    }

    #[test]
    fn test_rollback_never_touches_persisted_rows() {
        let mut cache = MessageCache::new();
        cache.set_rows("c1", page(vec![msg("m1", "one")], 1));

        assert!(!cache.rollback_optimistic("c1", "m1"));
        assert_eq!(cache.rows("c1").unwrap().len(), 1);
    }
}
