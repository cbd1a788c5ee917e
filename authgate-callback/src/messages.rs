//! Text shown to the user when a callback ends in error.

use authgate_core::{ExchangeFailure, FailureKind};

/// Shown when the redirect carries no usable code.
pub const MISSING_CODE: &str = "Authorization code is missing. Please sign in again.";

/// The message to display for `failure`.
pub fn user_message(failure: &ExchangeFailure) -> String {
    match failure.kind {
        FailureKind::MissingCode => MISSING_CODE.to_string(),
        FailureKind::NetworkUnreachable => {
            "Could not reach the server. Check your internet connection and try again."
                .to_string()
        }
        FailureKind::NoTokenInResponse => {
            "Sign-in failed: the server did not return an access token.".to_string()
        }
        FailureKind::ServerError if failure.message.is_empty() => {
            "Sign-in failed: the server could not complete the request.".to_string()
        }
        FailureKind::ServerError => format!("Sign-in failed: {}", failure.message),
        FailureKind::RequestSetupError => {
            format!("Sign-in could not be started: {}", failure.message)
        }
        FailureKind::AlreadyProcessed => "This sign-in link was already used.".to_string(),
        FailureKind::CodeExpiredOrInvalid => {
            "This sign-in link has expired. Please sign in again.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_message_is_actionable() {
        let failure = ExchangeFailure::new(FailureKind::NetworkUnreachable, "no response");
        assert!(user_message(&failure).contains("internet connection"));
    }

    #[test]
    fn test_server_detail_is_surfaced() {
        let failure = ExchangeFailure::new(FailureKind::ServerError, "Google is down");
        assert_eq!(user_message(&failure), "Sign-in failed: Google is down");

        let failure = ExchangeFailure::new(FailureKind::ServerError, "");
        assert!(user_message(&failure).ends_with("complete the request."));
    }

    #[test]
    fn test_missing_code() {
        let failure = ExchangeFailure::new(FailureKind::MissingCode, "empty");
        assert_eq!(user_message(&failure), MISSING_CODE);
    }
}
