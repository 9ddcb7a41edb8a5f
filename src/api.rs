//! REST collaborators.
//!
//! Three endpoints back the stream core: paginated history, send, and the
//! out-of-band interrupt signal. All run over the [`HttpClient`] trait so
//! tests can substitute a mock transport.
//!
//! The `load_history` and `send` helpers also apply the cache-side failure
//! semantics: a failed refresh keeps the last good rows and sets an error
//! flag; a failed send rolls its optimistic row back and records the error.

use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::models::{ChatMessage, MessageListPage, SendMessagePayload};
use crate::state::ClientState;
use crate::traits::{Headers, HttpClient, HttpError};

/// Client for the chat REST endpoints under `/api/v1`.
pub struct ChatApi<C: HttpClient> {
    http: C,
    base_url: String,
    page_size: u32,
    headers: Headers,
}

impl<C: HttpClient> ChatApi<C> {
    pub fn new(http: C, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            page_size: 10,
            headers: Headers::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Attach a header to every request (e.g. an explicit session cookie
    /// where no cookie store carries it).
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// `GET /api/v1/chats/:uuid/messages/list` — one page of history,
    /// newest-first.
    pub async fn list_messages(&self, chat_uuid: &str, page: u32) -> ClientResult<MessageListPage> {
        let url = self.url(&format!(
            "/api/v1/chats/{}/messages/list?page={}&limit={}",
            chat_uuid, page, self.page_size
        ));
        let response = self.http.get(&url, &self.headers).await?;
        if !response.is_success() {
            return Err(ClientError::Http(HttpError::Status {
                status: response.status,
                body: response.text(),
            }));
        }
        Ok(response.json()?)
    }

    /// `POST /api/v1/chats/:uuid/messages/send` — returns the persisted
    /// message.
    pub async fn send_message(&self, chat_uuid: &str, text: &str) -> ClientResult<ChatMessage> {
        let url = self.url(&format!("/api/v1/chats/{}/messages/send", chat_uuid));
        let payload = serde_json::to_value(SendMessagePayload {
            text: text.to_string(),
        })?;
        let response = self.http.post_json(&url, &payload, &self.headers).await?;
        if !response.is_success() {
            return Err(ClientError::Http(HttpError::Status {
                status: response.status,
                body: response.text(),
            }));
        }
        Ok(response.json()?)
    }

    /// `POST /api/v1/chats/:uuid/signals/interrupt` — ask the backend to
    /// stop the in-flight generation. Has no local effect: the visible
    /// outcome is driven entirely by the subsequent stream frames.
    pub async fn interrupt(&self, chat_uuid: &str) -> ClientResult<()> {
        let url = self.url(&format!("/api/v1/chats/{}/signals/interrupt", chat_uuid));
        let response = self
            .http
            .post_json(&url, &serde_json::json!({}), &self.headers)
            .await?;
        if !response.is_success() {
            return Err(ClientError::Http(HttpError::Status {
                status: response.status,
                body: response.text(),
            }));
        }
        debug!(chat = %chat_uuid, "Interrupt signal sent");
        Ok(())
    }

    /// Refresh a chat's first page into the cache.
    ///
    /// On failure the cache keeps its last good rows and surfaces the error
    /// flag instead of clearing data.
    pub async fn load_history(&self, state: &mut ClientState, chat_uuid: &str) {
        state.cache.set_loading(chat_uuid, true);
        match self.list_messages(chat_uuid, 1).await {
            Ok(page) => state.cache.set_rows(chat_uuid, page),
            Err(e) => {
                warn!(chat = %chat_uuid, "History refresh failed: {}", e);
                state.cache.set_load_error(chat_uuid, e.to_string());
            }
        }
    }

    /// Fetch the next older page and append it to the cache.
    pub async fn load_older(&self, state: &mut ClientState, chat_uuid: &str) {
        let next_page = state.cache.loaded_page(chat_uuid) + 1;
        state.cache.set_loading(chat_uuid, true);
        match self.list_messages(chat_uuid, next_page).await {
            Ok(page) => state.cache.extend_rows(chat_uuid, page),
            Err(e) => {
                warn!(chat = %chat_uuid, "Older-page fetch failed: {}", e);
                state.cache.set_load_error(chat_uuid, e.to_string());
            }
        }
    }

    /// Send a message with an optimistic local insert.
    ///
    /// The optimistic row appears at the head immediately; on confirmation
    /// it is superseded by the server's copy, on failure it is rolled back
    /// and the error recorded on the state. Never leaves the cache silently
    /// inconsistent with the server.
    pub async fn send(
        &self,
        state: &mut ClientState,
        chat_uuid: &str,
        sender_uuid: &str,
        text: &str,
    ) -> ClientResult<ChatMessage> {
        let client_uuid = state.cache.optimistic_insert(chat_uuid, sender_uuid, text);
        match self.send_message(chat_uuid, text).await {
            Ok(message) => {
                state.last_send_error = None;
                state.cache.reconcile(chat_uuid, message.clone());
                Ok(message)
            }
            Err(e) => {
                state.cache.rollback_optimistic(chat_uuid, &client_uuid);
                state.last_send_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
