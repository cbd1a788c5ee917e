//! Transport error types.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Why an HTTP call did not produce a successful response.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// A response arrived with a 4xx/5xx status.
    #[error("HTTP error {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, parsed as JSON when possible, otherwise a string.
        data: Value,
        /// Response headers.
        headers: HashMap<String, String>,
    },

    /// The request was sent but no response came back.
    #[error("No response received: {0}")]
    NoResponse(String),

    /// The request could not be constructed.
    #[error("Request setup failed: {0}")]
    Setup(String),
}

impl TransportError {
    /// Create a status error without headers.
    pub fn status(status: u16, data: Value) -> Self {
        Self::Status {
            status,
            data,
            headers: HashMap::new(),
        }
    }

    /// Create a no-response error.
    pub fn no_response(msg: impl Into<String>) -> Self {
        Self::NoResponse(msg.into())
    }

    /// Create a setup error.
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }

    /// The HTTP status if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The response body if a response was received.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Status { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Human-readable `detail` from the error body.
    ///
    /// Non-string details (validation error lists) are rendered as JSON.
    pub fn detail(&self) -> Option<String> {
        match self.data()?.get("detail")? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Machine-readable OAuth `error` code from the error body.
    pub fn error_code(&self) -> Option<&str> {
        self.data()?.get("error")?.as_str()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TransportError::Setup(err.to_string())
        } else {
            TransportError::NoResponse(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_and_error_code() {
        let err = TransportError::status(
            400,
            json!({"detail": "code expired", "error": "invalid_grant"}),
        );
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(err.detail().as_deref(), Some("code expired"));
        assert_eq!(err.error_code(), Some("invalid_grant"));
    }

    #[test]
    fn test_structured_detail_rendered_as_json() {
        let err = TransportError::status(422, json!({"detail": [{"msg": "field required"}]}));
        assert_eq!(
            err.detail().as_deref(),
            Some(r#"[{"msg":"field required"}]"#)
        );
    }

    #[test]
    fn test_no_detail_without_response() {
        let err = TransportError::no_response("connection refused");
        assert_eq!(err.status_code(), None);
        assert_eq!(err.detail(), None);
        assert_eq!(err.error_code(), None);

        let err = TransportError::status(502, Value::String("<html>bad gateway</html>".into()));
        assert_eq!(err.detail(), None);
    }
}
