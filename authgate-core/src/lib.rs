//! # authgate-core
//!
//! Core types, session state and configuration for the authgate
//! authorization-code exchange coordinator.
//!
//! This crate provides the foundational types shared by every other crate:
//!
//! - **Types**: [`AuthorizationCode`], [`AccessToken`], [`UserProfile`]
//! - **Session**: [`SessionState`] and the shared [`SessionHandle`]
//! - **Outcome**: [`ExchangeOutcome`] and the [`FailureKind`] taxonomy
//! - **Config**: [`AuthGateConfig`] and its sections
//! - **Clock**: wall-clock abstraction used by the processed-code ledger
//!
//! ## Example
//!
//! ```rust
//! use authgate_core::{AuthorizationCode, SessionHandle, SessionState, UserProfile};
//!
//! let code = AuthorizationCode::new("4/0AbCdEfGhIjKlMnOp").unwrap();
//! assert_eq!(code.redacted(), "4/0AbCdEfG... (len 19)");
//!
//! let session = SessionHandle::new();
//! session.commit(SessionState::authenticated(UserProfile::new(1)));
//! assert!(session.snapshot().is_authenticated);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod errors;
pub mod outcome;
pub mod session;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ApiConfig, AuthGateConfig, ExchangeConfig, LedgerConfig, NavigationConfig, StorageKeys,
    Verification,
};
pub use errors::{ConfigError, ValidationError};
pub use outcome::{ExchangeFailure, ExchangeOutcome, FailureKind};
pub use session::{AuthError, SessionHandle, SessionState};
pub use types::{AccessToken, AuthorizationCode, UserProfile};
