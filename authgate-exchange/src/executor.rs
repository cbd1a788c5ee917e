//! The exchange protocol.

use crate::classify::ErrorClassifier;
use crate::TokenResponse;
use authgate_core::{
    AccessToken, ApiConfig, AuthorizationCode, ExchangeConfig, ExchangeFailure, ExchangeOutcome,
    FailureKind, SessionHandle, SessionState, StorageKeys, UserProfile, Verification,
};
use authgate_storage::KeyValueStore;
use authgate_transport::{HttpClient, TokenCredentials};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Performs the code → token → profile → session protocol.
///
/// The executor is the only writer of the session, the persisted token and
/// profile, and the credential slot. It never retries.
#[derive(Clone)]
pub struct ExchangeExecutor {
    http: Arc<dyn HttpClient>,
    store: Arc<dyn KeyValueStore>,
    credentials: TokenCredentials,
    session: SessionHandle,
    api: ApiConfig,
    keys: StorageKeys,
    config: ExchangeConfig,
    classifier: ErrorClassifier,
}

impl ExchangeExecutor {
    /// Create an executor with default endpoints, keys and settings.
    ///
    /// `store` is the persistent scope; `credentials` must be the same slot
    /// the HTTP client reads from.
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<dyn KeyValueStore>,
        credentials: TokenCredentials,
        session: SessionHandle,
    ) -> Self {
        let config = ExchangeConfig::default();
        Self {
            http,
            store,
            credentials,
            session,
            api: ApiConfig::default(),
            keys: StorageKeys::default(),
            classifier: ErrorClassifier::from_config(&config),
            config,
        }
    }

    /// Set the endpoint paths.
    #[must_use]
    pub fn with_api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    /// Set the storage keys.
    #[must_use]
    pub fn with_keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Set the exchange behavior.
    #[must_use]
    pub fn with_config(mut self, config: ExchangeConfig) -> Self {
        self.classifier = ErrorClassifier::from_config(&config);
        self.config = config;
        self
    }

    /// The session this executor writes.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// The credential slot this executor writes.
    pub fn credentials(&self) -> &TokenCredentials {
        &self.credentials
    }

    /// Exchange `code` for an authenticated session.
    ///
    /// An empty code fails with [`FailureKind::MissingCode`] before any
    /// request is made.
    pub async fn exchange(&self, code: &str) -> ExchangeOutcome {
        let code = match AuthorizationCode::new(code) {
            Ok(code) => code,
            Err(e) => {
                return self.fail(ExchangeFailure::new(FailureKind::MissingCode, e.to_string()))
            }
        };

        info!(code = %code.redacted(), "Exchanging authorization code");

        match self.run(&code).await {
            Ok(profile) => {
                info!(user_id = profile.id, "Authorization code exchange completed");
                self.verify().await;
                ExchangeOutcome::Success { profile }
            }
            Err(failure) => self.fail(failure),
        }
    }

    async fn run(&self, code: &AuthorizationCode) -> Result<UserProfile, ExchangeFailure> {
        let response = self
            .http
            .post(&self.api.token_path, json!({ "code": code.as_str() }))
            .await
            .map_err(|e| self.classifier.classify_exchange(&e))?;
        debug!(status = response.status, "Token endpoint responded");

        let token = serde_json::from_value::<TokenResponse>(response.data)
            .ok()
            .and_then(|body| body.access_token)
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
            .ok_or_else(|| {
                ExchangeFailure::new(
                    FailureKind::NoTokenInResponse,
                    "The server did not return an access token.",
                )
                .with_status(response.status)
            })?;

        self.store
            .set(&self.keys.token, token.secret())
            .map_err(|e| storage_failure("access token", e))?;
        self.credentials.set(token);
        debug!("Access token stored and set as request credential");

        let response = self
            .http
            .get(&self.api.profile_path)
            .await
            .map_err(|e| self.classifier.classify(&e))?;
        let profile: UserProfile = serde_json::from_value(response.data).map_err(|e| {
            ExchangeFailure::new(
                FailureKind::ServerError,
                format!("The profile response could not be read: {}", e),
            )
            .with_status(response.status)
        })?;

        let serialized = serde_json::to_string(&profile)
            .map_err(|e| storage_failure("user profile", e))?;
        self.store
            .set(&self.keys.user, &serialized)
            .map_err(|e| storage_failure("user profile", e))?;

        self.session.commit(SessionState::authenticated(profile.clone()));
        Ok(profile)
    }

    /// Confirm the new token works. Never changes the committed session.
    async fn verify(&self) {
        match self.config.verification {
            Verification::Off => {}
            Verification::Inline => self.verify_token().await,
            Verification::Background => match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let this = self.clone();
                    handle.spawn(async move { this.verify_token().await });
                }
                Err(_) => debug!("No async runtime for background token verification"),
            },
        }
    }

    async fn verify_token(&self) {
        match self.http.get(&self.api.verify_path).await {
            Ok(response) => debug!(status = response.status, "Token verification succeeded"),
            Err(e) => warn!(error = %e, "Token verification failed; session kept"),
        }
    }

    /// Reset everything the exchange may have written and report `failure`.
    fn fail(&self, failure: ExchangeFailure) -> ExchangeOutcome {
        warn!(
            kind = %failure.kind,
            status = ?failure.status,
            message = %failure.message,
            "Authorization code exchange failed"
        );
        self.clear_persisted();
        self.session.commit(SessionState::failed(&failure));
        ExchangeOutcome::Failure(failure)
    }

    /// Load a previously committed session from the persistent store.
    ///
    /// Both the token and a readable profile must be present; anything else
    /// is cleared and the session starts signed out.
    pub fn restore_session(&self) -> SessionState {
        let token = self.store.get(&self.keys.token);
        let user = self.store.get(&self.keys.user);

        match (token, user) {
            (Ok(Some(token)), Ok(Some(user))) if !token.is_empty() => {
                match serde_json::from_str::<UserProfile>(&user) {
                    Ok(profile) => {
                        self.credentials.set(AccessToken::new(token));
                        let state = SessionState::authenticated(profile);
                        self.session.commit(state.clone());
                        info!("Restored persisted session");
                        return state;
                    }
                    Err(e) => warn!(error = %e, "Persisted user profile is corrupted"),
                }
            }
            (Err(e), _) | (_, Err(e)) => warn!(error = %e, "Could not read persisted session"),
            _ => debug!("No persisted session"),
        }

        self.clear_persisted();
        let state = SessionState::unauthenticated();
        self.session.commit(state.clone());
        state
    }

    /// Sign out: drop the token, the profile and the session.
    pub fn logout(&self) {
        self.clear_persisted();
        self.session.commit(SessionState::unauthenticated());
        info!("Signed out");
    }

    fn clear_persisted(&self) {
        self.credentials.clear();
        for key in [&self.keys.token, &self.keys.user] {
            if let Err(e) = self.store.remove(key) {
                warn!(key = %key, error = %e, "Failed to clear persisted auth data");
            }
        }
    }
}

impl fmt::Debug for ExchangeExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeExecutor")
            .field("api", &self.api)
            .field("keys", &self.keys)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn storage_failure(what: &str, err: impl fmt::Display) -> ExchangeFailure {
    ExchangeFailure::new(
        FailureKind::RequestSetupError,
        format!("Failed to store the {}: {}", what, err),
    )
}
