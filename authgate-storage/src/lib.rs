//! # authgate-storage
//!
//! Scoped key-value storage and the processed-code ledger.
//!
//! - [`KeyValueStore`]: the string key/value boundary every backend implements
//! - [`MemoryStore`]: process-lifetime store, used for the session scope
//! - [`FileStore`]: JSON-file store that survives restarts
//! - [`ScopedStores`]: the session-scoped and persistent stores side by side
//! - [`ProcessedCodeLedger`]: bounded, time-windowed record of submitted codes
//!
//! Store operations are synchronous. The coordinator consults the ledger
//! without suspending, which is what lets the ledger write happen strictly
//! before the exchange request goes out.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod ledger;
pub mod store;

pub use error::StorageError;
pub use ledger::ProcessedCodeLedger;
pub use store::{FileStore, KeyValueStore, MemoryStore, ScopedStores};
