//! # authgate - Idempotent OAuth Code Exchange
//!
//! authgate handles the redirect leg of an OAuth 2.0 authorization-code
//! sign-in: it takes the one-time `code` from the callback URL, exchanges it
//! for an access token exactly once, loads the user's profile and commits the
//! session, or classifies the failure and decides where the user goes next.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use authgate::prelude::*;
//! use std::sync::Arc;
//!
//! struct Browser;
//!
//! impl Navigator for Browser {
//!     fn navigate(&self, location: &Location) {
//!         println!("-> {}", location.path);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> authgate::Result<()> {
//!     let gate = AuthGate::from_env()?;
//!     let report = gate
//!         .handle_redirect("https://app.example.com/auth/callback?code=4/0Ab", Arc::new(Browser))
//!         .await?;
//!     println!("{:?}", report.map(|r| r.state));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`authgate_core`] - domain types, session state, outcomes, configuration
//! - [`authgate_storage`] - key-value stores and the processed-code ledger
//! - [`authgate_transport`] - HTTP client boundary, reqwest client, credentials
//! - [`authgate_exchange`] - the exchange executor
//! - [`authgate_callback`] - the callback coordinator
//!
//! ## Environment
//!
//! | Variable | Default |
//! |----------|---------|
//! | `AUTHGATE_API_BASE_URL` | `http://127.0.0.1:8000` |
//! | `AUTHGATE_TIMEOUT_SECS` | `30` |
//! | `AUTHGATE_LEDGER_MAX_ENTRIES` | `50` |
//! | `AUTHGATE_LEDGER_WINDOW_SECS` | `86400` |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

mod error;
mod gate;

pub use error::{Error, Result};
pub use gate::{AuthGate, AuthGateBuilder};

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Core types, session state and configuration.
pub use authgate_core as core;

/// Storage backends and the processed-code ledger.
pub use authgate_storage as storage;

/// HTTP client boundary.
pub use authgate_transport as transport;

/// The exchange executor.
pub use authgate_exchange as exchange;

/// The callback coordinator.
pub use authgate_callback as callback;

// ============================================================================
// Flat Re-exports
// ============================================================================

pub use authgate_callback::{
    CallbackCoordinator, CallbackReport, CallbackState, Location, NavigationTarget, Navigator,
    RedirectParams,
};
pub use authgate_core::{
    AccessToken, AuthError, AuthGateConfig, AuthorizationCode, ExchangeFailure, ExchangeOutcome,
    FailureKind, SessionHandle, SessionState, UserProfile,
};
pub use authgate_exchange::ExchangeExecutor;
pub use authgate_storage::{FileStore, KeyValueStore, MemoryStore, ScopedStores};
pub use authgate_transport::{HttpClient, ReqwestHttpClient, TokenCredentials};

/// Everything needed to wire and drive the flow.
pub mod prelude {
    pub use crate::{AuthGate, AuthGateBuilder, Error, Result};

    pub use crate::core::{
        ApiConfig, AuthGateConfig, ExchangeConfig, ExchangeOutcome, FailureKind, LedgerConfig,
        NavigationConfig, SessionState, UserProfile, Verification,
    };

    pub use crate::callback::{
        CallbackCoordinator, CallbackReport, CallbackState, Location, NavigationTarget, Navigator,
        RedirectParams,
    };

    pub use crate::storage::{FileStore, KeyValueStore, MemoryStore, ScopedStores};
}
