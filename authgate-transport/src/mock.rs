//! Scripted HTTP client for testing.
//!
//! [`MockHttpClient`] answers each `(method, path)` from a queue of
//! pre-configured results and records every request it sees, including the
//! bearer token that was attached at the time.
//!
//! ```rust
//! use authgate_transport::{HttpResponse, MockHttpClient};
//! use serde_json::json;
//!
//! let http = MockHttpClient::new()
//!     .on_post("/auth/google", Ok(HttpResponse::ok(json!({"access_token": "T1"}))))
//!     .on_get("/users/me", Ok(HttpResponse::ok(json!({"id": 1, "name": "Ana"}))));
//! assert_eq!(http.request_count(), 0);
//! ```

use crate::client::{HttpClient, HttpMethod, HttpResponse};
use crate::credentials::CredentialProvider;
use crate::error::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

type Scripted = Result<HttpResponse, TransportError>;

/// A request observed by [`MockHttpClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Method.
    pub method: HttpMethod,
    /// Path as passed by the caller.
    pub path: String,
    /// JSON body for POST.
    pub body: Option<Value>,
    /// Bearer token attached when the request was made.
    pub bearer: Option<String>,
}

/// An [`HttpClient`] with pre-configured responses.
///
/// Unscripted requests fail with [`TransportError::NoResponse`].
#[derive(Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<(HttpMethod, String), VecDeque<Scripted>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    latency: Option<Duration>,
}

impl MockHttpClient {
    /// Create a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for `POST path`.
    pub fn on_post(self, path: impl Into<String>, result: Scripted) -> Self {
        self.push(HttpMethod::Post, path.into(), result);
        self
    }

    /// Queue a result for `GET path`.
    pub fn on_get(self, path: impl Into<String>, result: Scripted) -> Self {
        self.push(HttpMethod::Get, path.into(), result);
        self
    }

    /// Record the bearer token from `credentials` on each request.
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Suspend for `latency` before answering each request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// All requests seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Total number of requests.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of requests to `method path`.
    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn push(&self, method: HttpMethod, path: String, result: Scripted) {
        self.responses
            .lock()
            .entry((method, path))
            .or_default()
            .push_back(result);
    }

    async fn answer(&self, method: HttpMethod, path: &str, body: Option<Value>) -> Scripted {
        self.requests.lock().push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
            bearer: self
                .credentials
                .as_ref()
                .and_then(|c| c.access_token())
                .map(|t| t.secret().to_string()),
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.responses
            .lock()
            .get_mut(&(method, path.to_string()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(TransportError::no_response(format!(
                    "no scripted response for {} {}",
                    method, path
                )))
            })
    }
}

impl std::fmt::Debug for MockHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpClient")
            .field("requests", &self.request_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post(&self, path: &str, body: Value) -> Result<HttpResponse, TransportError> {
        self.answer(HttpMethod::Post, path, Some(body)).await
    }

    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        self.answer(HttpMethod::Get, path, None).await
    }
}
