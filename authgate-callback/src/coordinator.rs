//! The callback state machine.

use crate::guard::ProcessingGuard;
use crate::messages::{self, MISSING_CODE};
use crate::navigation::{NavigationTarget, Navigator};
use crate::params::RedirectParams;
use authgate_core::{
    AuthorizationCode, ExchangeFailure, ExchangeOutcome, FailureKind, NavigationConfig,
};
use authgate_exchange::ExchangeExecutor;
use authgate_storage::ProcessedCodeLedger;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a callback instance is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackState {
    /// Mounted, nothing done yet.
    Idle,
    /// Checking the redirect parameters and the ledger.
    Guarding,
    /// The executor is running.
    Exchanging,
    /// Finished with a redirect.
    Done(NavigationTarget),
    /// Finished with a message for the user.
    Errored(String),
}

impl CallbackState {
    /// Whether this state is final for the instance.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Errored(_))
    }

    /// The message to display, if the callback errored.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Errored(message) => Some(message),
            _ => None,
        }
    }
}

/// The result of one [`CallbackCoordinator::handle`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackReport {
    /// Terminal state reached.
    pub state: CallbackState,
    /// The exchange outcome, when the code reached the ledger check.
    pub outcome: Option<ExchangeOutcome>,
}

/// One mounted callback.
///
/// Create a fresh coordinator for every arrival at the callback location; the
/// ledger and executor it is given are the shared, session-wide pieces.
pub struct CallbackCoordinator {
    executor: ExchangeExecutor,
    ledger: ProcessedCodeLedger,
    navigator: Arc<dyn Navigator>,
    navigation: NavigationConfig,
    state: Mutex<CallbackState>,
    processing: AtomicBool,
    navigated: AtomicBool,
}

impl CallbackCoordinator {
    /// Mount a callback with the default navigation targets.
    pub fn new(
        executor: ExchangeExecutor,
        ledger: ProcessedCodeLedger,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            executor,
            ledger,
            navigator,
            navigation: NavigationConfig::default(),
            state: Mutex::new(CallbackState::Idle),
            processing: AtomicBool::new(false),
            navigated: AtomicBool::new(false),
        }
    }

    /// Set the navigation targets.
    #[must_use]
    pub fn with_navigation(mut self, navigation: NavigationConfig) -> Self {
        self.navigation = navigation;
        self
    }

    /// Current state.
    pub fn state(&self) -> CallbackState {
        self.state.lock().clone()
    }

    /// Drive the callback for `params` to a terminal state.
    ///
    /// Returns `None` without doing anything when another call on this
    /// instance is in flight or the instance already finished.
    pub async fn handle(&self, params: &RedirectParams) -> Option<CallbackReport> {
        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            debug!("Callback already in progress; ignoring");
            return None;
        };
        if self.state.lock().is_terminal() {
            debug!("Callback already finished; ignoring");
            return None;
        }

        match self.ledger.purge_if_stale() {
            Ok(true) => debug!("Ledger purged on callback entry"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to purge processed-code ledger"),
        }
        self.set_state(CallbackState::Guarding);

        if let Some(error) = &params.error {
            warn!(
                error = %error,
                description = ?params.error_description,
                "Identity provider returned an error"
            );
        }
        let Some(code) = params.code().and_then(|c| AuthorizationCode::new(c).ok()) else {
            warn!("No authorization code in redirect");
            return Some(self.finish(CallbackState::Errored(MISSING_CODE.to_string()), None));
        };

        match self.ledger.contains(&code) {
            Ok(true) => {
                info!(code = %code.redacted(), "Code already processed; redirecting");
                return Some(self.finish(
                    CallbackState::Done(NavigationTarget::Landing),
                    Some(ExchangeFailure::already_processed().into()),
                ));
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Could not read processed-code ledger"),
        }

        if self.executor.session().is_authenticated() {
            info!("Session already authenticated; skipping exchange");
            return Some(self.finish(CallbackState::Done(NavigationTarget::Landing), None));
        }

        if let Err(e) = self.ledger.record(&code) {
            warn!(error = %e, "Could not record code in processed-code ledger");
        }

        self.set_state(CallbackState::Exchanging);
        let outcome = self.executor.exchange(code.as_str()).await;
        let state = self.interpret(&outcome);
        Some(self.finish(state, Some(outcome)))
    }

    /// Leave an errored callback for the login page.
    ///
    /// Returns whether a navigation happened.
    pub fn return_to_login(&self) -> bool {
        if self.state.lock().error_message().is_none() {
            return false;
        }
        self.navigate_once(NavigationTarget::Login {
            expired_code: false,
        })
    }

    fn interpret(&self, outcome: &ExchangeOutcome) -> CallbackState {
        match outcome {
            ExchangeOutcome::Success { profile } => {
                let target = if profile.needs_profile_update()
                    && self.navigation.profile_completion_path.is_some()
                {
                    NavigationTarget::ProfileCompletion
                } else {
                    NavigationTarget::Landing
                };
                CallbackState::Done(target)
            }
            ExchangeOutcome::Failure(failure) => match failure.kind {
                FailureKind::CodeExpiredOrInvalid => {
                    info!("Authorization code expired; restarting sign-in");
                    CallbackState::Done(NavigationTarget::Login { expired_code: true })
                }
                FailureKind::AlreadyProcessed => CallbackState::Done(NavigationTarget::Landing),
                _ => CallbackState::Errored(messages::user_message(failure)),
            },
        }
    }

    fn finish(&self, state: CallbackState, outcome: Option<ExchangeOutcome>) -> CallbackReport {
        self.set_state(state.clone());
        if let CallbackState::Done(target) = &state {
            self.navigate_once(*target);
        }
        CallbackReport { state, outcome }
    }

    fn navigate_once(&self, target: NavigationTarget) -> bool {
        if self.navigated.swap(true, Ordering::AcqRel) {
            warn!(?target, "Callback already navigated; ignoring");
            return false;
        }
        let location = target.resolve(&self.navigation);
        debug!(path = %location.path, replace = location.replace, "Navigating");
        self.navigator.navigate(&location);
        true
    }

    fn set_state(&self, state: CallbackState) {
        *self.state.lock() = state;
    }
}

impl fmt::Debug for CallbackCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackCoordinator")
            .field("state", &*self.state.lock())
            .field("processing", &self.processing.load(Ordering::Relaxed))
            .field("navigated", &self.navigated.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{Location, MockNavigator};
    use authgate_core::{
        Clock, ExchangeConfig, LedgerConfig, ManualClock, SessionHandle, StorageKeys, UserProfile,
        Verification,
    };
    use authgate_storage::{KeyValueStore, MemoryStore};
    use authgate_transport::{
        HttpMethod, HttpResponse, MockHttpClient, TokenCredentials, TransportError,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    struct Env {
        http: MockHttpClient,
        session_store: MemoryStore,
        persistent: MemoryStore,
        executor: ExchangeExecutor,
        ledger: ProcessedCodeLedger,
        clock: Arc<ManualClock>,
    }

    fn env(http: MockHttpClient) -> Env {
        let credentials = TokenCredentials::new();
        let http = http.with_credentials(Arc::new(credentials.clone()));
        let session_store = MemoryStore::new();
        let persistent = MemoryStore::new();
        let executor = ExchangeExecutor::new(
            Arc::new(http.clone()),
            Arc::new(persistent.clone()),
            credentials,
            SessionHandle::new(),
        )
        .with_config(ExchangeConfig::new().verification(Verification::Inline));
        let clock = Arc::new(ManualClock::new(10 * DAY_MS));
        let ledger = ProcessedCodeLedger::new(
            Arc::new(session_store.clone()),
            LedgerConfig::default(),
            &StorageKeys::default(),
        )
        .with_clock(clock.clone());
        ledger.purge_if_stale().unwrap();
        Env {
            http,
            session_store,
            persistent,
            executor,
            ledger,
            clock,
        }
    }

    fn success_http() -> MockHttpClient {
        MockHttpClient::new()
            .on_post("/auth/google", Ok(HttpResponse::ok(json!({"access_token": "T1"}))))
            .on_get("/users/me", Ok(HttpResponse::ok(json!({"id": 1, "name": "Ana"}))))
            .on_get("/notifications", Ok(HttpResponse::ok(json!([]))))
    }

    fn expect_navigation(path: &'static str) -> MockNavigator {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(move |location: &Location| location.path == path)
            .times(1)
            .return_const(());
        navigator
    }

    fn no_navigation() -> MockNavigator {
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate().never();
        navigator
    }

    fn mount(env: &Env, navigator: MockNavigator) -> CallbackCoordinator {
        CallbackCoordinator::new(env.executor.clone(), env.ledger.clone(), Arc::new(navigator))
    }

    #[tokio::test]
    async fn test_successful_callback_lands() {
        let env = env(success_http());
        let coordinator = mount(&env, expect_navigation("/"));
        assert_eq!(coordinator.state(), CallbackState::Idle);

        let report = coordinator
            .handle(&RedirectParams::with_code("abc123"))
            .await
            .unwrap();

        assert_eq!(report.state, CallbackState::Done(NavigationTarget::Landing));
        assert!(report.outcome.unwrap().is_success());
        assert_eq!(coordinator.state(), report.state);

        let session = env.executor.session().snapshot();
        assert!(session.is_authenticated);
        assert!(session.has_token);
        assert_eq!(
            session.user_data,
            Some(UserProfile::new(1).with_name("Ana"))
        );
        assert!(session.auth_error.is_none());
        assert_eq!(env.ledger.entries().unwrap(), vec!["abc123".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_silent() {
        let env = env(success_http());

        let first = mount(&env, expect_navigation("/"));
        first.handle(&RedirectParams::with_code("abc123")).await;
        let session = env.executor.session().snapshot();
        let requests = env.http.request_count();

        let second = mount(&env, expect_navigation("/"));
        let report = second
            .handle(&RedirectParams::with_code("abc123"))
            .await
            .unwrap();

        assert_eq!(report.state, CallbackState::Done(NavigationTarget::Landing));
        assert_eq!(
            report.outcome.and_then(|o| o.failure_kind()),
            Some(FailureKind::AlreadyProcessed)
        );
        assert_eq!(env.http.request_count(), requests);
        assert_eq!(env.executor.session().snapshot(), session);
    }

    #[tokio::test]
    async fn test_authenticated_session_still_requires_code() {
        let env = env(success_http());
        env.executor
            .session()
            .commit(authgate_core::SessionState::authenticated(UserProfile::new(5)));
        let coordinator = mount(&env, no_navigation());

        let report = coordinator.handle(&RedirectParams::new()).await.unwrap();

        assert_eq!(report.state, CallbackState::Errored(MISSING_CODE.to_string()));
        assert_eq!(env.http.request_count(), 0);
        assert!(env.executor.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_processed_code_short_circuits() {
        let env = env(success_http());
        env.ledger
            .record(&AuthorizationCode::new("abc123").unwrap())
            .unwrap();

        let coordinator = mount(&env, expect_navigation("/"));
        let report = coordinator
            .handle(&RedirectParams::with_code("abc123"))
            .await
            .unwrap();

        assert_eq!(report.state, CallbackState::Done(NavigationTarget::Landing));
        assert_eq!(
            report.outcome.and_then(|o| o.failure_kind()),
            Some(FailureKind::AlreadyProcessed)
        );
        assert_eq!(env.http.request_count(), 0);
        assert_eq!(report.state.error_message(), None);
    }

    #[tokio::test]
    async fn test_rapid_double_delivery_makes_one_exchange() {
        let env = env(success_http().with_latency(Duration::from_millis(20)));
        let first = mount(&env, expect_navigation("/"));
        let second = mount(&env, expect_navigation("/"));
        let params = RedirectParams::with_code("abc123");

        let (a, b) = tokio::join!(first.handle(&params), second.handle(&params));

        assert_eq!(env.http.count(HttpMethod::Post, "/auth/google"), 1);
        let outcomes = [a.unwrap(), b.unwrap()];
        assert!(outcomes
            .iter()
            .all(|r| r.state == CallbackState::Done(NavigationTarget::Landing)));
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| r.outcome.as_ref().map(|o| o.is_success()) == Some(true))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_reentrant_handle_is_noop() {
        let env = env(success_http().with_latency(Duration::from_millis(20)));
        let coordinator = mount(&env, expect_navigation("/"));
        let params = RedirectParams::with_code("abc123");

        let (a, b) = tokio::join!(coordinator.handle(&params), coordinator.handle(&params));

        assert_eq!([a.is_some(), b.is_some()].iter().filter(|x| **x).count(), 1);
        assert_eq!(env.http.count(HttpMethod::Post, "/auth/google"), 1);

        // Terminal: later calls do nothing.
        assert!(coordinator.handle(&params).await.is_none());
        assert_eq!(env.http.count(HttpMethod::Post, "/auth/google"), 1);
    }

    #[tokio::test]
    async fn test_expired_code_redirects_to_login() {
        let env = env(MockHttpClient::new().on_post(
            "/auth/google",
            Err(TransportError::status(400, json!({"detail": "код истек"}))),
        ));
        let coordinator = mount(&env, expect_navigation("/login?auth_error=expired_code"));

        let report = coordinator
            .handle(&RedirectParams::with_code("expired1"))
            .await
            .unwrap();

        assert_eq!(
            report.state,
            CallbackState::Done(NavigationTarget::Login { expired_code: true })
        );
        assert_eq!(report.state.error_message(), None);
        assert_eq!(
            report.outcome.and_then(|o| o.failure_kind()),
            Some(FailureKind::CodeExpiredOrInvalid)
        );
        assert!(!env.executor.session().is_authenticated());
        assert_eq!(env.persistent.get("token").unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_code_errors_without_network() {
        let env = env(success_http());
        let coordinator = mount(&env, no_navigation());

        let report = coordinator.handle(&RedirectParams::new()).await.unwrap();

        assert_eq!(report.state, CallbackState::Errored(MISSING_CODE.to_string()));
        assert_eq!(report.outcome, None);
        assert_eq!(env.http.request_count(), 0);
        assert!(env.ledger.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_provider_error_counts_as_missing_code() {
        let env = env(success_http());
        let coordinator = mount(&env, no_navigation());

        let params = RedirectParams::from_query("code=abc123&error=access_denied");
        let report = coordinator.handle(&params).await.unwrap();

        assert_eq!(report.state.error_message(), Some(MISSING_CODE));
        assert_eq!(env.http.request_count(), 0);
    }

    #[tokio::test]
    async fn test_network_failure_shows_message_and_allows_return() {
        let env = env(MockHttpClient::new().on_post(
            "/auth/google",
            Err(TransportError::no_response("connection refused")),
        ));
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(|location: &Location| location == &Location::push("/login"))
            .times(1)
            .return_const(());
        let coordinator = mount(&env, navigator);

        let report = coordinator
            .handle(&RedirectParams::with_code("abc123"))
            .await
            .unwrap();

        let message = report.state.error_message().unwrap();
        assert!(message.contains("internet connection"));
        // The failed code stays recorded.
        assert_eq!(env.ledger.len().unwrap(), 1);

        assert!(coordinator.return_to_login());
        assert!(!coordinator.return_to_login());
    }

    #[tokio::test]
    async fn test_return_to_login_only_when_errored() {
        let env = env(success_http());
        let coordinator = mount(&env, expect_navigation("/"));
        assert!(!coordinator.return_to_login());

        coordinator
            .handle(&RedirectParams::with_code("abc123"))
            .await
            .unwrap();
        assert!(!coordinator.return_to_login());
    }

    #[tokio::test]
    async fn test_already_authenticated_skips_exchange() {
        let env = env(success_http());
        env.executor
            .session()
            .commit(authgate_core::SessionState::authenticated(UserProfile::new(5)));
        let coordinator = mount(&env, expect_navigation("/"));

        let report = coordinator
            .handle(&RedirectParams::with_code("fresh"))
            .await
            .unwrap();

        assert_eq!(report.state, CallbackState::Done(NavigationTarget::Landing));
        assert_eq!(report.outcome, None);
        assert_eq!(env.http.request_count(), 0);
        assert!(env.ledger.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_incomplete_profile_goes_to_completion_page() {
        let env = env(success_http());
        let coordinator = mount(&env, expect_navigation("/complete-profile")).with_navigation(
            NavigationConfig::default().profile_completion_path("/complete-profile"),
        );

        let report = coordinator
            .handle(&RedirectParams::with_code("abc123"))
            .await
            .unwrap();

        assert_eq!(
            report.state,
            CallbackState::Done(NavigationTarget::ProfileCompletion)
        );
        assert!(env.executor.session().snapshot().needs_profile_update);
    }

    #[tokio::test]
    async fn test_entry_purges_stale_ledger() {
        let env = env(success_http());
        env.ledger
            .record(&AuthorizationCode::new("abc123").unwrap())
            .unwrap();
        env.session_store
            .set("lastCodeClearing", &(env.clock.now_millis() - DAY_MS - 1).to_string())
            .unwrap();

        let coordinator = mount(&env, expect_navigation("/"));
        let report = coordinator
            .handle(&RedirectParams::with_code("abc123"))
            .await
            .unwrap();

        // The purge forgot the code, so it was exchanged.
        assert!(report.outcome.unwrap().is_success());
        assert_eq!(
            env.session_store.get("lastCodeClearing").unwrap(),
            Some(env.clock.now_millis().to_string())
        );
    }
}
