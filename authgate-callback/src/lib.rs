//! # authgate-callback
//!
//! The callback coordinator: the part of the flow that runs when the identity
//! provider redirects back with `?code=...`.
//!
//! A redirect can arrive more than once for the same code (reload, double
//! mount, back button) while the provider accepts each code only once. The
//! coordinator puts the exchange behind two guards:
//!
//! - the processed-code ledger, written *before* the exchange request goes
//!   out, so a second delivery of the same code resolves silently
//! - a per-instance processing flag, so overlapping calls on one mount are
//!   no-ops
//!
//! It then turns the exchange outcome into exactly one navigation or a
//! message for the user:
//!
//! | Outcome | State | Navigation |
//! |---------|-------|------------|
//! | success | `Done` | landing (or profile completion) |
//! | already processed | `Done` | landing |
//! | code expired or invalid | `Done` | login with the expired-code marker |
//! | missing code | `Errored` | none |
//! | anything else | `Errored` | none, until [`CallbackCoordinator::return_to_login`] |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod coordinator;
pub mod guard;
pub mod messages;
pub mod navigation;
pub mod params;

pub use coordinator::{CallbackCoordinator, CallbackReport, CallbackState};
pub use guard::ProcessingGuard;
pub use messages::{user_message, MISSING_CODE};
pub use navigation::{Location, NavigationTarget, Navigator};
pub use params::RedirectParams;
