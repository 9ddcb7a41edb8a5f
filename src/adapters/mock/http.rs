//! In-process mock HTTP client.
//!
//! Responses are queued per URL suffix and served in order; requests are
//! recorded for assertions. Suffix matching keeps tests independent of the
//! configured base URL.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::traits::{Headers, HttpClient, HttpError, HttpResponse};

/// A request observed by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

#[derive(Default)]
struct MockInner {
    queued: Vec<(String, VecDeque<Result<HttpResponse, HttpError>>)>,
    requests: Vec<RecordedRequest>,
}

/// Mock [`HttpClient`] for unit tests.
#[derive(Default)]
pub struct MockHttpClient {
    inner: Mutex<MockInner>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response for requests whose URL ends with `suffix`.
    pub fn queue_json(&self, suffix: &str, status: u16, body: &str) {
        self.queue(suffix, Ok(HttpResponse::new(status, Bytes::from(body.to_string()))));
    }

    /// Queue a transport error for requests whose URL ends with `suffix`.
    pub fn queue_error(&self, suffix: &str, error: HttpError) {
        self.queue(suffix, Err(error));
    }

    fn queue(&self, suffix: &str, result: Result<HttpResponse, HttpError>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some((_, queue)) = inner.queued.iter_mut().find(|(s, _)| s == suffix) {
            queue.push_back(result);
        } else {
            let mut queue = VecDeque::new();
            queue.push_back(result);
            inner.queued.push((suffix.to_string(), queue));
        }
    }

    /// Every request the mock has seen, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    fn respond(
        &self,
        method: &str,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse, HttpError> {
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            body,
        });

        let path = url.split('?').next().unwrap_or(url);
        inner
            .queued
            .iter_mut()
            .find(|(suffix, _)| path.ends_with(suffix.as_str()))
            .and_then(|(_, queue)| queue.pop_front())
            .unwrap_or_else(|| {
                Err(HttpError::Other(format!("no mock response queued for {}", url)))
            })
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, _headers: &Headers) -> Result<HttpResponse, HttpError> {
        self.respond("GET", url, None)
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        _headers: &Headers,
    ) -> Result<HttpResponse, HttpError> {
        self.respond("POST", url, Some(body.clone()))
    }
}
