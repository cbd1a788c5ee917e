//! Failure classification for transport errors.
//!
//! The token endpoint signals a spent or expired code with HTTP 400. A
//! structured OAuth `error` of `invalid_grant` is trusted first; otherwise
//! the free-text `detail` is scanned for configured markers. The text scan is
//! a heuristic for backends that only send prose.

use authgate_core::{ExchangeConfig, ExchangeFailure, FailureKind};
use authgate_transport::TransportError;

const INVALID_GRANT: &str = "invalid_grant";

/// Maps [`TransportError`]s to [`ExchangeFailure`]s.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    expiry_markers: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::from_config(&ExchangeConfig::default())
    }
}

impl ErrorClassifier {
    /// Create a classifier with the given expiry markers.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            expiry_markers: markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// Create a classifier from the exchange settings.
    pub fn from_config(config: &ExchangeConfig) -> Self {
        Self::new(&config.expiry_markers)
    }

    /// Classify a failure of the token exchange request.
    pub fn classify_exchange(&self, err: &TransportError) -> ExchangeFailure {
        if err.status_code() == Some(400) && self.is_expired_code(err) {
            return ExchangeFailure::new(
                FailureKind::CodeExpiredOrInvalid,
                "The authorization code has expired or was already used. Please sign in again.",
            )
            .with_status(400);
        }
        self.classify(err)
    }

    /// Classify a failure of any other request in the flow.
    pub fn classify(&self, err: &TransportError) -> ExchangeFailure {
        match err {
            TransportError::Status { status, .. } => {
                let message = err
                    .detail()
                    .unwrap_or_else(|| format!("Server responded with HTTP {}", status));
                ExchangeFailure::new(FailureKind::ServerError, message).with_status(*status)
            }
            TransportError::NoResponse(_) => ExchangeFailure::new(
                FailureKind::NetworkUnreachable,
                "No response from the server. Check your internet connection.",
            ),
            TransportError::Setup(msg) => ExchangeFailure::new(
                FailureKind::RequestSetupError,
                format!("The request could not be sent: {}", msg),
            ),
        }
    }

    fn is_expired_code(&self, err: &TransportError) -> bool {
        if let Some(code) = err.error_code() {
            return code == INVALID_GRANT;
        }
        let Some(detail) = err.detail() else {
            return false;
        };
        let detail = detail.to_lowercase();
        self.expiry_markers.iter().any(|m| detail.contains(m.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{json, Value};

    #[rstest]
    #[case::russian_detail(400, json!({"detail": "Код истек"}), FailureKind::CodeExpiredOrInvalid)]
    #[case::invalid_grant_in_detail(400, json!({"detail": "Google said invalid_grant"}), FailureKind::CodeExpiredOrInvalid)]
    #[case::english_detail(400, json!({"detail": "Code EXPIRED"}), FailureKind::CodeExpiredOrInvalid)]
    #[case::structured_code(400, json!({"error": "invalid_grant"}), FailureKind::CodeExpiredOrInvalid)]
    #[case::structured_code_wins(400, json!({"error": "invalid_request", "detail": "expired"}), FailureKind::ServerError)]
    #[case::plain_400(400, json!({"detail": "email is required"}), FailureKind::ServerError)]
    #[case::no_body_400(400, Value::Null, FailureKind::ServerError)]
    #[case::expired_but_401(401, json!({"detail": "token expired"}), FailureKind::ServerError)]
    #[case::server_error(500, json!({"detail": "boom"}), FailureKind::ServerError)]
    fn test_classify_exchange_status(
        #[case] status: u16,
        #[case] body: Value,
        #[case] expected: FailureKind,
    ) {
        let classifier = ErrorClassifier::default();
        let failure = classifier.classify_exchange(&TransportError::status(status, body));
        assert_eq!(failure.kind, expected);
        assert_eq!(failure.status, Some(status));
    }

    #[test]
    fn test_server_error_carries_detail() {
        let failure = ErrorClassifier::default()
            .classify_exchange(&TransportError::status(500, json!({"detail": "db down"})));
        assert_eq!(failure.message, "db down");

        let failure =
            ErrorClassifier::default().classify_exchange(&TransportError::status(502, Value::Null));
        assert_eq!(failure.message, "Server responded with HTTP 502");
    }

    #[test]
    fn test_transport_kinds() {
        let classifier = ErrorClassifier::default();
        assert_eq!(
            classifier
                .classify_exchange(&TransportError::no_response("refused"))
                .kind,
            FailureKind::NetworkUnreachable
        );
        assert_eq!(
            classifier.classify(&TransportError::setup("bad header")).kind,
            FailureKind::RequestSetupError
        );
    }

    #[test]
    fn test_profile_errors_never_read_as_expired_code() {
        let failure = ErrorClassifier::default()
            .classify(&TransportError::status(400, json!({"detail": "expired"})));
        assert_eq!(failure.kind, FailureKind::ServerError);
    }

    #[test]
    fn test_custom_markers() {
        let classifier = ErrorClassifier::new(["abgelaufen"]);
        let failure = classifier
            .classify_exchange(&TransportError::status(400, json!({"detail": "Code abgelaufen"})));
        assert_eq!(failure.kind, FailureKind::CodeExpiredOrInvalid);

        let failure = classifier
            .classify_exchange(&TransportError::status(400, json!({"detail": "expired"})));
        assert_eq!(failure.kind, FailureKind::ServerError);
    }
}
