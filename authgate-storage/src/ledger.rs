//! The processed-code ledger.
//!
//! An ordered list of authorization codes that have already been submitted
//! for exchange, stored as a JSON array under one key of the session store.
//! It is capped (oldest evicted first) and wiped entirely once per purge
//! window, tracked by a millisecond timestamp under a second key.

use crate::error::StorageError;
use crate::store::KeyValueStore;
use authgate_core::{AuthorizationCode, Clock, LedgerConfig, StorageKeys, SystemClock};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Bounded, time-windowed record of submitted codes.
///
/// Clones share the underlying store.
#[derive(Clone)]
pub struct ProcessedCodeLedger {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
    codes_key: String,
    cleared_key: String,
}

impl ProcessedCodeLedger {
    /// Create a ledger over `store` using the system clock.
    ///
    /// A `max_entries` of zero is raised to one; an empty cap would forget
    /// every code as soon as it is recorded.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        mut config: LedgerConfig,
        keys: &StorageKeys,
    ) -> Self {
        if config.max_entries == 0 {
            warn!("Processed-code ledger cap of 0 raised to 1");
            config.max_entries = 1;
        }
        Self {
            store,
            clock: Arc::new(SystemClock),
            config,
            codes_key: keys.processed_codes.clone(),
            cleared_key: keys.last_cleared.clone(),
        }
    }

    /// Use a different clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The ledger bounds.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// All recorded codes, oldest first.
    ///
    /// A value that is not a JSON string array is treated as an empty ledger;
    /// the next [`record`](Self::record) overwrites it.
    pub fn entries(&self) -> Result<Vec<String>, StorageError> {
        let Some(raw) = self.store.get(&self.codes_key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(codes) => Ok(codes),
            Err(e) => {
                warn!(key = %self.codes_key, error = %e, "Discarding unreadable processed-code ledger");
                Ok(Vec::new())
            }
        }
    }

    /// Number of recorded codes.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.entries()?.len())
    }

    /// Whether nothing is recorded.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.entries()?.is_empty())
    }

    /// Whether `code` was already submitted.
    pub fn contains(&self, code: &AuthorizationCode) -> Result<bool, StorageError> {
        Ok(self.entries()?.iter().any(|c| c == code.as_str()))
    }

    /// Mark `code` as submitted.
    ///
    /// Appends the code unless it is already present, then evicts from the
    /// front until the ledger fits `max_entries`.
    pub fn record(&self, code: &AuthorizationCode) -> Result<(), StorageError> {
        let mut codes = self.entries()?;
        if codes.iter().any(|c| c == code.as_str()) {
            return Ok(());
        }
        codes.push(code.as_str().to_string());

        let overflow = codes.len().saturating_sub(self.config.max_entries);
        if overflow > 0 {
            codes.drain(..overflow);
            debug!(evicted = overflow, "Evicted oldest processed codes");
        }

        self.store
            .set(&self.codes_key, &serde_json::to_string(&codes)?)?;
        debug!(code = %code.redacted(), size = codes.len(), "Recorded processed code");
        Ok(())
    }

    /// Clear the ledger if the last purge is missing, older than the window,
    /// or in the future.
    ///
    /// Returns whether a purge happened.
    pub fn purge_if_stale(&self) -> Result<bool, StorageError> {
        let now = self.clock.now_millis();
        let last = self
            .store
            .get(&self.cleared_key)?
            .and_then(|raw| raw.trim().parse::<i64>().ok());

        let stale = match last {
            None => true,
            Some(last) if last > now => true,
            Some(last) => now.saturating_sub(last) > self.config.purge_window_millis(),
        };
        if !stale {
            return Ok(false);
        }

        self.store.set(&self.codes_key, "[]")?;
        self.store.set(&self.cleared_key, &now.to_string())?;
        info!(last_cleared = ?last, now, "Purged processed-code ledger");
        Ok(true)
    }

    /// Drop every recorded code, leaving the purge timestamp alone.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.set(&self.codes_key, "[]")
    }
}

impl fmt::Debug for ProcessedCodeLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessedCodeLedger")
            .field("config", &self.config)
            .field("codes_key", &self.codes_key)
            .field("cleared_key", &self.cleared_key)
            .finish()
    }
}
