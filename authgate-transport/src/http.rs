//! reqwest-backed [`HttpClient`].

use crate::client::{HttpClient, HttpResponse};
use crate::credentials::CredentialProvider;
use crate::error::TransportError;
use async_trait::async_trait;
use authgate_core::ApiConfig;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// HTTP client for the backend API.
///
/// Every request resolves its path against the base URL and carries the
/// credential provider's current token, if any.
#[derive(Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl ReqwestHttpClient {
    /// Create a client with a default reqwest client.
    pub fn new(
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            client: Client::new(),
            base_url: normalize_base(base_url)?,
            credentials,
        })
    }

    /// Create a client from API settings, applying the request timeout.
    pub fn from_config(
        api: &ApiConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| TransportError::setup(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: normalize_base(&api.base_url)?,
            credentials,
        })
    }

    /// Use a custom reqwest client.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// The base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::setup(format!("invalid path {:?}: {}", path, e)))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<HttpResponse, TransportError> {
        let url = self.url(path)?;
        let mut request = self.client.request(method.clone(), url.clone());

        if let Some(token) = self.credentials.access_token() {
            let value = HeaderValue::from_str(&token.bearer()).map_err(|e| {
                TransportError::setup(format!("invalid authorization header: {}", e))
            })?;
            request = request.header(AUTHORIZATION, value);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        debug!(method = %method, url = %url, "Sending request");

        let response = request.send().await.map_err(|e| {
            let err = TransportError::from(e);
            warn!(method = %method, url = %url, error = %err, "Request failed without a response");
            err
        })?;

        let status = response.status();
        let headers = collect_headers(response.headers());
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let err = body_read_error(status, headers, e.to_string());
                warn!(method = %method, url = %url, error = %err, "Failed to read response body");
                return Err(err);
            }
        };
        let data = parse_body(text);

        debug!(method = %method, url = %url, status = status.as_u16(), "Received response");

        if !status.is_success() {
            warn!(method = %method, url = %url, status = status.as_u16(), "Request returned error status");
            return Err(TransportError::Status {
                status: status.as_u16(),
                data,
                headers,
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            data,
            headers,
        })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post(&self, path: &str, body: Value) -> Result<HttpResponse, TransportError> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError> {
        self.send(Method::GET, path, None).await
    }
}

impl fmt::Debug for ReqwestHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestHttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Parse the base URL and make sure relative joins append to its path.
fn normalize_base(base_url: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| TransportError::setup(format!("invalid base url {:?}: {}", base_url, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// A body that could not be read still carries the status it arrived with.
fn body_read_error(
    status: StatusCode,
    headers: HashMap<String, String>,
    reason: String,
) -> TransportError {
    if status.is_success() {
        return TransportError::no_response(format!("failed to read response body: {}", reason));
    }
    TransportError::Status {
        status: status.as_u16(),
        data: Value::Null,
        headers,
    }
}

fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
