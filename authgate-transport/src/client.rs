//! The HTTP client seam.

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// HTTP method used by the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body, parsed as JSON when possible.
    pub data: Value,
    /// Response headers.
    pub headers: HashMap<String, String>,
}

impl HttpResponse {
    /// Create a response with no headers.
    pub fn new(status: u16, data: Value) -> Self {
        Self {
            status,
            data,
            headers: HashMap::new(),
        }
    }

    /// A 200 response.
    pub fn ok(data: Value) -> Self {
        Self::new(200, data)
    }
}

/// Client for the backend API.
///
/// Paths are relative to the client's base URL. Implementations attach the
/// current bearer credential themselves; callers never pass tokens.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST a JSON body.
    async fn post(&self, path: &str, body: Value) -> Result<HttpResponse, TransportError>;

    /// GET a resource.
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportError>;
}
