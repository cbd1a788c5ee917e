//! Result of one exchange attempt.

use crate::types::UserProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a failed (or short-circuited) exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No code was supplied; nothing was sent.
    MissingCode,
    /// The code was already submitted by an earlier delivery.
    AlreadyProcessed,
    /// The provider rejected the code as expired or already used.
    CodeExpiredOrInvalid,
    /// The token endpoint answered 2xx without an `access_token`.
    NoTokenInResponse,
    /// The request was sent but no response arrived.
    NetworkUnreachable,
    /// Any other error status from the server.
    ServerError,
    /// The request could not be built.
    RequestSetupError,
}

impl FailureKind {
    /// Stable snake_case tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCode => "missing_code",
            Self::AlreadyProcessed => "already_processed",
            Self::CodeExpiredOrInvalid => "code_expired_or_invalid",
            Self::NoTokenInResponse => "no_token_in_response",
            Self::NetworkUnreachable => "network_unreachable",
            Self::ServerError => "server_error",
            Self::RequestSetupError => "request_setup_error",
        }
    }

    /// Conditions that are part of normal operation and never shown as errors.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::AlreadyProcessed | Self::CodeExpiredOrInvalid)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ExchangeFailure {
    /// What went wrong.
    pub kind: FailureKind,
    /// Message suitable for display; carries provider detail when present.
    pub message: String,
    /// HTTP status, when a response was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ExchangeFailure {
    /// Create a failure without a status.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Attach the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// The failure recorded for a duplicate delivery.
    pub fn already_processed() -> Self {
        Self::new(
            FailureKind::AlreadyProcessed,
            "authorization code was already submitted",
        )
    }
}

/// Tagged result of one exchange attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// The session was committed for this profile.
    Success {
        /// Profile fetched with the new credential.
        profile: UserProfile,
    },
    /// The attempt failed and the session was reset.
    Failure(ExchangeFailure),
}

impl ExchangeOutcome {
    /// Whether the exchange succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The failure kind, if any.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failure(failure) => Some(failure.kind),
            Self::Success { .. } => None,
        }
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&ExchangeFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::Success { .. } => None,
        }
    }

    /// The committed profile, if the exchange succeeded.
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::Success { profile } => Some(profile),
            Self::Failure(_) => None,
        }
    }
}

impl From<ExchangeFailure> for ExchangeOutcome {
    fn from(failure: ExchangeFailure) -> Self {
        Self::Failure(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FailureKind::AlreadyProcessed, true)]
    #[case(FailureKind::CodeExpiredOrInvalid, true)]
    #[case(FailureKind::MissingCode, false)]
    #[case(FailureKind::NoTokenInResponse, false)]
    #[case(FailureKind::NetworkUnreachable, false)]
    #[case(FailureKind::ServerError, false)]
    #[case(FailureKind::RequestSetupError, false)]
    fn test_expected_kinds(#[case] kind: FailureKind, #[case] expected: bool) {
        assert_eq!(kind.is_expected(), expected);
    }

    #[test]
    fn test_kind_serde_tag_matches_as_str() {
        let kind = FailureKind::CodeExpiredOrInvalid;
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json, serde_json::json!(kind.as_str()));
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome: ExchangeOutcome =
            ExchangeFailure::new(FailureKind::ServerError, "boom").with_status(502).into();
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure_kind(), Some(FailureKind::ServerError));
        assert_eq!(outcome.failure().and_then(|f| f.status), Some(502));
        assert!(outcome.profile().is_none());
    }

    #[test]
    fn test_failure_display() {
        let failure = ExchangeFailure::new(FailureKind::NoTokenInResponse, "no token");
        assert_eq!(failure.to_string(), "no_token_in_response: no token");
    }
}
