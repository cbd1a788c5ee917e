//! Top-level error type.

use authgate_core::ConfigError;
use authgate_storage::StorageError;
use authgate_transport::TransportError;
use thiserror::Error;

/// Errors from setting up or driving authgate.
///
/// Exchange failures are not errors: they come back as
/// [`ExchangeOutcome::Failure`](authgate_core::ExchangeOutcome::Failure).
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage backend failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// HTTP client could not be built.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Callback URL could not be parsed.
    #[error("Invalid callback URL: {0}")]
    InvalidCallbackUrl(#[from] url::ParseError),
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
