//! Wiring of the whole flow from one configuration.

use crate::error::Result;
use authgate_callback::{CallbackCoordinator, CallbackReport, Navigator, RedirectParams};
use authgate_core::{AuthGateConfig, Clock, SessionHandle, SessionState};
use authgate_exchange::ExchangeExecutor;
use authgate_storage::{ProcessedCodeLedger, ScopedStores};
use authgate_transport::{HttpClient, ReqwestHttpClient, TokenCredentials};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The session-wide pieces of the flow: stores, credential slot, HTTP
/// client, session, ledger and executor.
///
/// Mount a fresh [`CallbackCoordinator`] for every arrival at the callback
/// location with [`mount`](Self::mount).
///
/// ```rust,no_run
/// use authgate::prelude::*;
///
/// # fn main() -> authgate::Result<()> {
/// let gate = AuthGate::builder()
///     .config(AuthGateConfig::from_env()?)
///     .build()?;
/// let state = gate.restore_session();
/// println!("signed in: {}", state.is_authenticated);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthGate {
    config: AuthGateConfig,
    executor: ExchangeExecutor,
    ledger: ProcessedCodeLedger,
}

impl AuthGate {
    /// Start building.
    pub fn builder() -> AuthGateBuilder {
        AuthGateBuilder::new()
    }

    /// Build with `config`, in-memory stores and the reqwest client.
    pub fn new(config: AuthGateConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Build from `AUTHGATE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(AuthGateConfig::from_env()?)
    }

    /// The configuration in use.
    pub fn config(&self) -> &AuthGateConfig {
        &self.config
    }

    /// The shared session.
    pub fn session(&self) -> &SessionHandle {
        self.executor.session()
    }

    /// The executor.
    pub fn executor(&self) -> &ExchangeExecutor {
        &self.executor
    }

    /// The processed-code ledger.
    pub fn ledger(&self) -> &ProcessedCodeLedger {
        &self.ledger
    }

    /// A new callback instance that navigates through `navigator`.
    pub fn mount(&self, navigator: Arc<dyn Navigator>) -> CallbackCoordinator {
        CallbackCoordinator::new(self.executor.clone(), self.ledger.clone(), navigator)
            .with_navigation(self.config.navigation.clone())
    }

    /// Mount a callback and drive it with the query of `url`.
    pub async fn handle_redirect(
        &self,
        url: &str,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Option<CallbackReport>> {
        let params = RedirectParams::from_url(url)?;
        Ok(self.mount(navigator).handle(&params).await)
    }

    /// Load a persisted session, if there is a valid one.
    pub fn restore_session(&self) -> SessionState {
        self.executor.restore_session()
    }

    /// Sign out.
    pub fn logout(&self) {
        self.executor.logout();
    }
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("config", &self.config)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AuthGate`].
#[derive(Default)]
pub struct AuthGateBuilder {
    config: AuthGateConfig,
    stores: Option<ScopedStores>,
    http: Option<(Arc<dyn HttpClient>, TokenCredentials)>,
    clock: Option<Arc<dyn Clock>>,
    session: Option<SessionHandle>,
}

impl AuthGateBuilder {
    /// Defaults everywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    #[must_use]
    pub fn config(mut self, config: AuthGateConfig) -> Self {
        self.config = config;
        self
    }

    /// Use these stores instead of two in-memory ones.
    #[must_use]
    pub fn stores(mut self, stores: ScopedStores) -> Self {
        self.stores = Some(stores);
        self
    }

    /// Use this HTTP client instead of the reqwest one.
    ///
    /// `credentials` must be the slot `http` reads its bearer token from.
    #[must_use]
    pub fn http_client(
        mut self,
        http: Arc<dyn HttpClient>,
        credentials: TokenCredentials,
    ) -> Self {
        self.http = Some((http, credentials));
        self
    }

    /// Use this clock for the ledger purge window.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an existing session handle.
    #[must_use]
    pub fn session(mut self, session: SessionHandle) -> Self {
        self.session = Some(session);
        self
    }

    /// Validate the configuration and wire everything together.
    pub fn build(self) -> Result<AuthGate> {
        let config = self.config;
        config.validate()?;

        let stores = self.stores.unwrap_or_else(ScopedStores::in_memory);
        let (http, credentials) = match self.http {
            Some(pair) => pair,
            None => {
                let credentials = TokenCredentials::new();
                let client =
                    ReqwestHttpClient::from_config(&config.api, Arc::new(credentials.clone()))?;
                (Arc::new(client) as Arc<dyn HttpClient>, credentials)
            }
        };

        let executor = ExchangeExecutor::new(
            http,
            stores.persistent.clone(),
            credentials,
            self.session.unwrap_or_default(),
        )
        .with_api(config.api.clone())
        .with_keys(config.keys.clone())
        .with_config(config.exchange.clone());

        let mut ledger =
            ProcessedCodeLedger::new(stores.session.clone(), config.ledger.clone(), &config.keys);
        if let Some(clock) = self.clock {
            ledger = ledger.with_clock(clock);
        }

        debug!(base_url = %config.api.base_url, "AuthGate configured");
        Ok(AuthGate {
            config,
            executor,
            ledger,
        })
    }
}

impl fmt::Debug for AuthGateBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGateBuilder")
            .field("config", &self.config)
            .field("stores", &self.stores.is_some())
            .field("http", &self.http.is_some())
            .finish_non_exhaustive()
    }
}
