//! Client-side session state.
//!
//! [`SessionState`] is only ever replaced wholesale through
//! [`SessionHandle::commit`], so readers never observe a half-applied
//! exchange.

use crate::outcome::{ExchangeFailure, FailureKind};
use crate::types::UserProfile;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error tag carried by the session after a failed exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthError {
    /// No error.
    #[default]
    None,
    /// The last exchange failed.
    Failed {
        /// Failure classification.
        kind: FailureKind,
        /// Failure message.
        message: String,
    },
}

impl AuthError {
    /// True when no error is recorded.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The recorded failure kind.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::None => None,
            Self::Failed { kind, .. } => Some(*kind),
        }
    }
}

impl From<&ExchangeFailure> for AuthError {
    fn from(failure: &ExchangeFailure) -> Self {
        Self::Failed {
            kind: failure.kind,
            message: failure.message.clone(),
        }
    }
}

/// The authenticated-session view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Whether a user is signed in.
    pub is_authenticated: bool,
    /// Profile of the signed-in user.
    pub user_data: Option<UserProfile>,
    /// Whether a bearer token is held.
    pub has_token: bool,
    /// Error from the last exchange attempt.
    pub auth_error: AuthError,
    /// Whether an operation is pending.
    pub is_loading: bool,
    /// Whether the user still has to complete their profile.
    #[serde(default)]
    pub needs_profile_update: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::unauthenticated()
    }
}

impl SessionState {
    /// A signed-out session with no error.
    pub fn unauthenticated() -> Self {
        Self {
            is_authenticated: false,
            user_data: None,
            has_token: false,
            auth_error: AuthError::None,
            is_loading: false,
            needs_profile_update: false,
        }
    }

    /// A signed-in session for `profile`.
    pub fn authenticated(profile: UserProfile) -> Self {
        Self {
            is_authenticated: true,
            needs_profile_update: profile.needs_profile_update(),
            user_data: Some(profile),
            has_token: true,
            auth_error: AuthError::None,
            is_loading: false,
        }
    }

    /// A signed-out session that records `failure`.
    pub fn failed(failure: &ExchangeFailure) -> Self {
        Self {
            auth_error: failure.into(),
            ..Self::unauthenticated()
        }
    }

    /// Check the session invariants.
    ///
    /// Authenticated implies a token and a profile; a recorded error implies
    /// not authenticated.
    pub fn is_consistent(&self) -> bool {
        let auth_ok = !self.is_authenticated || (self.has_token && self.user_data.is_some());
        let error_ok = self.auth_error.is_none() || !self.is_authenticated;
        auth_ok && error_ok
    }
}

/// Shared, process-wide handle to the session.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    /// Create a handle holding an unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle around an existing state.
    pub fn with_state(state: SessionState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.inner.read().clone()
    }

    /// Whether the session is currently authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().is_authenticated
    }

    /// Replace the whole state at once.
    pub fn commit(&self, state: SessionState) {
        debug_assert!(state.is_consistent(), "inconsistent session state");
        *self.inner.write() = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_unauthenticated() {
        let state = SessionState::default();
        assert!(!state.is_authenticated);
        assert!(state.auth_error.is_none());
        assert!(state.is_consistent());
    }

    #[test]
    fn test_authenticated_state() {
        let profile = UserProfile::new(1).with_name("Ana");
        let state = SessionState::authenticated(profile.clone());
        assert!(state.is_authenticated);
        assert!(state.has_token);
        assert_eq!(state.user_data, Some(profile));
        assert!(state.needs_profile_update);
        assert!(state.is_consistent());
    }

    #[test]
    fn test_failed_state() {
        let failure = ExchangeFailure::new(FailureKind::NetworkUnreachable, "offline");
        let state = SessionState::failed(&failure);
        assert!(!state.is_authenticated);
        assert!(!state.has_token);
        assert_eq!(state.auth_error.kind(), Some(FailureKind::NetworkUnreachable));
        assert!(state.is_consistent());
    }

    #[test]
    fn test_inconsistent_states_detected() {
        let mut state = SessionState::unauthenticated();
        state.is_authenticated = true;
        assert!(!state.is_consistent());

        let mut state = SessionState::authenticated(UserProfile::new(1));
        state.auth_error = AuthError::Failed {
            kind: FailureKind::ServerError,
            message: "x".into(),
        };
        assert!(!state.is_consistent());
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(SessionState::unauthenticated()).unwrap();
        assert_eq!(json["isAuthenticated"], serde_json::json!(false));
        assert_eq!(json["authError"], serde_json::json!("none"));
    }

    #[test]
    fn test_handle_commit_is_shared() {
        let handle = SessionHandle::new();
        let other = handle.clone();
        handle.commit(SessionState::authenticated(UserProfile::new(7)));
        assert!(other.is_authenticated());
        assert_eq!(other.snapshot().user_data.map(|u| u.id), Some(7));
    }
}
