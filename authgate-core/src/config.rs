//! Configuration for the exchange flow.
//!
//! Every section has sensible defaults matching the backend this crate was
//! built against; override what differs with the builder methods or
//! [`AuthGateConfig::from_env`].

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Environment variable for [`ApiConfig::base_url`].
pub const ENV_BASE_URL: &str = "AUTHGATE_API_BASE_URL";
/// Environment variable for [`ApiConfig::timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "AUTHGATE_TIMEOUT_SECS";
/// Environment variable for [`LedgerConfig::max_entries`].
pub const ENV_LEDGER_MAX_ENTRIES: &str = "AUTHGATE_LEDGER_MAX_ENTRIES";
/// Environment variable for [`LedgerConfig::purge_window_secs`].
pub const ENV_LEDGER_WINDOW_SECS: &str = "AUTHGATE_LEDGER_WINDOW_SECS";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthGateConfig {
    /// Backend API settings.
    pub api: ApiConfig,
    /// Processed-code ledger settings.
    pub ledger: LedgerConfig,
    /// Storage key names.
    pub keys: StorageKeys,
    /// Navigation targets.
    pub navigation: NavigationConfig,
    /// Executor behavior.
    pub exchange: ExchangeConfig,
}

impl AuthGateConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `AUTHGATE_*` environment variables, defaulting the rest.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.api.base_url = base_url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.api.timeout_secs = parse_number(ENV_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LEDGER_MAX_ENTRIES) {
            config.ledger.max_entries = parse_number(ENV_LEDGER_MAX_ENTRIES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LEDGER_WINDOW_SECS) {
            config.ledger.purge_window_secs = parse_number(ENV_LEDGER_WINDOW_SECS, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the API section.
    #[must_use]
    pub fn api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    /// Set the ledger section.
    #[must_use]
    pub fn ledger(mut self, ledger: LedgerConfig) -> Self {
        self.ledger = ledger;
        self
    }

    /// Set the storage keys.
    #[must_use]
    pub fn keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Set the navigation section.
    #[must_use]
    pub fn navigation(mut self, navigation: NavigationConfig) -> Self {
        self.navigation = navigation;
        self
    }

    /// Set the exchange section.
    #[must_use]
    pub fn exchange(mut self, exchange: ExchangeConfig) -> Self {
        self.exchange = exchange;
        self
    }

    /// Reject values the flow cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.parsed_base_url()?;
        if self.ledger.max_entries == 0 {
            return Err(ConfigError::OutOfRange(
                "ledger.max_entries must be at least 1".into(),
            ));
        }
        if self.ledger.purge_window_secs == 0 {
            return Err(ConfigError::OutOfRange(
                "ledger.purge_window_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid_value(key, raw))
}

/// Backend API endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every path is resolved against.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Token exchange endpoint.
    pub token_path: String,
    /// Profile endpoint.
    pub profile_path: String,
    /// Endpoint hit once after commit to confirm the token works.
    pub verify_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
            token_path: "/auth/google".to_string(),
            profile_path: "/users/me".to_string(),
            verify_path: "/notifications".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create with a base URL and default paths.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the token exchange path.
    #[must_use]
    pub fn token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Set the profile path.
    #[must_use]
    pub fn profile_path(mut self, path: impl Into<String>) -> Self {
        self.profile_path = path.into();
        self
    }

    /// Set the verification path.
    #[must_use]
    pub fn verify_path(mut self, path: impl Into<String>) -> Self {
        self.verify_path = path.into();
        self
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parse and check the base URL.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })
    }
}

/// Bounds for the processed-code ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Most codes kept; older ones are evicted first.
    pub max_entries: usize,
    /// The whole ledger is cleared once per this many seconds.
    pub purge_window_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_entries: 50,
            purge_window_secs: 24 * 60 * 60,
        }
    }
}

impl LedgerConfig {
    /// Create the default ledger config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size cap.
    #[must_use]
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the purge window.
    #[must_use]
    pub fn purge_window(mut self, window: Duration) -> Self {
        self.purge_window_secs = window.as_secs();
        self
    }

    /// Purge window in milliseconds.
    pub fn purge_window_millis(&self) -> i64 {
        i64::try_from(self.purge_window_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

/// Key names in the key-value stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    /// JSON array of processed codes (session scope).
    pub processed_codes: String,
    /// Millisecond timestamp of the last ledger purge (session scope).
    pub last_cleared: String,
    /// Persisted access token.
    pub token: String,
    /// Persisted user profile (JSON).
    pub user: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            processed_codes: "processedCodes".to_string(),
            last_cleared: "lastCodeClearing".to_string(),
            token: "token".to_string(),
            user: "user".to_string(),
        }
    }
}

/// Where the callback sends the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Default landing location.
    pub landing_path: String,
    /// Login entry point.
    pub login_path: String,
    /// Query key of the expired-code indicator.
    pub expired_param: String,
    /// Query value of the expired-code indicator.
    pub expired_value: String,
    /// Where incomplete profiles go after sign-in; landing when unset.
    pub profile_completion_path: Option<String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            landing_path: "/".to_string(),
            login_path: "/login".to_string(),
            expired_param: "auth_error".to_string(),
            expired_value: "expired_code".to_string(),
            profile_completion_path: None,
        }
    }
}

impl NavigationConfig {
    /// Set the landing path.
    #[must_use]
    pub fn landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    /// Set the login path.
    #[must_use]
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Route incomplete profiles to `path` after sign-in.
    #[must_use]
    pub fn profile_completion_path(mut self, path: impl Into<String>) -> Self {
        self.profile_completion_path = Some(path.into());
        self
    }
}

/// How the post-commit token check runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    /// Awaited before `exchange` returns.
    Inline,
    /// Spawned on the current tokio runtime.
    #[default]
    Background,
    /// Skipped.
    Off,
}

/// Executor behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Case-insensitive substrings of a 400 `detail` that mean the code is
    /// expired or already used. Only consulted when the body carries no
    /// structured `error` code.
    pub expiry_markers: Vec<String>,
    /// Post-commit verification mode.
    pub verification: Verification,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            expiry_markers: vec![
                "истек".to_string(),
                "invalid_grant".to_string(),
                "expired".to_string(),
            ],
            verification: Verification::default(),
        }
    }
}

impl ExchangeConfig {
    /// Create the default exchange config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the verification mode.
    #[must_use]
    pub fn verification(mut self, mode: Verification) -> Self {
        self.verification = mode;
        self
    }

    /// Add an expiry marker.
    #[must_use]
    pub fn expiry_marker(mut self, marker: impl Into<String>) -> Self {
        self.expiry_markers.push(marker.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AuthGateConfig::default();
        assert_eq!(config.api.token_path, "/auth/google");
        assert_eq!(config.ledger.max_entries, 50);
        assert_eq!(config.ledger.purge_window_millis(), 86_400_000);
        assert_eq!(config.keys.processed_codes, "processedCodes");
        assert_eq!(config.navigation.login_path, "/login");
        assert_eq!(config.exchange.verification, Verification::Background);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = AuthGateConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://api.example.com"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_LEDGER_MAX_ENTRIES, "3"),
            (ENV_LEDGER_WINDOW_SECS, "60"),
        ]))
        .unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.timeout(), Duration::from_secs(5));
        assert_eq!(config.ledger.max_entries, 3);
        assert_eq!(config.ledger.purge_window_secs, 60);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = AuthGateConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert_eq!(err, ConfigError::invalid_value(ENV_TIMEOUT_SECS, "soon"));
    }

    #[test]
    fn test_validate_rejects_zero_cap_and_bad_url() {
        let config = AuthGateConfig::new().ledger(LedgerConfig::new().max_entries(0));
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange(_))));

        let config = AuthGateConfig::new().api(ApiConfig::new("not a url"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AuthGateConfig =
            serde_json::from_str(r#"{"api": {"base_url": "https://x.test"}}"#).unwrap();
        assert_eq!(config.api.base_url, "https://x.test");
        assert_eq!(config.api.profile_path, "/users/me");
        assert_eq!(config.ledger, LedgerConfig::default());
    }
}
