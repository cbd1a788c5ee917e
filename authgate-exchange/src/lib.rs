//! # authgate-exchange
//!
//! The exchange executor: turns one authorization code into a committed,
//! authenticated session, or into a classified failure with the session
//! fully reset.
//!
//! The protocol runs strictly in order:
//!
//! 1. `POST` the code to the token endpoint
//! 2. require an `access_token` in the response
//! 3. persist the token and make it the request credential
//! 4. `GET` the profile with that credential
//! 5. commit the authenticated [`SessionState`](authgate_core::SessionState)
//! 6. best-effort `GET` of a protected resource, logged only
//!
//! Any failure in 1–4 clears the persisted token and profile and commits an
//! unauthenticated session carrying the error. Nothing is ever retried: a
//! used code cannot succeed a second time.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod classify;
pub mod executor;

pub use classify::ErrorClassifier;
pub use executor::ExchangeExecutor;

/// Body of a successful token endpoint response.
///
/// `access_token` is optional here so that a 2xx without one can be told
/// apart from a transport failure.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenResponse {
    /// Bearer token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token type, usually `bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
