//! Credential and profile types exchanged with the identity provider.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of leading characters of a code that may appear in logs.
const REDACTED_PREFIX_CHARS: usize = 10;

/// A one-time authorization code delivered by the identity provider's redirect.
///
/// The wrapped value is never empty. `Debug` only shows a redacted prefix so
/// codes cannot leak into logs by accident.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    /// Create a code, rejecting empty input.
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        if code.is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        Ok(Self(code))
    }

    /// Get the raw code value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the raw code.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Length of the code in characters.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A log-safe rendering: the first few characters and the total length.
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(REDACTED_PREFIX_CHARS).collect();
        format!("{}... (len {})", prefix, self.len())
    }
}

impl TryFrom<String> for AuthorizationCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AuthorizationCode> for String {
    fn from(code: AuthorizationCode) -> Self {
        code.0
    }
}

impl AsRef<str> for AuthorizationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthorizationCode")
            .field(&self.redacted())
            .finish()
    }
}

/// An opaque bearer credential returned by the token endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building an `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// The `Authorization` header value for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// The authenticated user's profile as returned by the profile endpoint.
///
/// Only `id` is required. Fields this crate does not interpret are kept in
/// `extra` so the profile round-trips through storage unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider-side user identifier.
    pub id: i64,
    /// Email address, when the provider shares it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Application role, absent until the user completes their profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Whether the account is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Any other fields returned by the profile endpoint.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Create a profile with only an id.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            email: None,
            name: None,
            role: None,
            is_active: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    /// True when the account still has to pick a role or be activated.
    pub fn needs_profile_update(&self) -> bool {
        self.is_active != Some(true) || self.role.is_none()
    }
}
