//! Credential providers consulted per request.

use authgate_core::AccessToken;
use parking_lot::RwLock;
use std::sync::Arc;

/// Supplies the bearer token for outgoing requests.
pub trait CredentialProvider: Send + Sync {
    /// The token to attach, if any.
    fn access_token(&self) -> Option<AccessToken>;
}

/// Never attaches a token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn access_token(&self) -> Option<AccessToken> {
        None
    }
}

/// A shared, settable token slot.
///
/// Clones share the same slot: the executor keeps one clone to write and the
/// HTTP client keeps another to read.
#[derive(Debug, Clone, Default)]
pub struct TokenCredentials {
    slot: Arc<RwLock<Option<AccessToken>>>,
}

impl TokenCredentials {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `token` the credential for subsequent requests.
    pub fn set(&self, token: AccessToken) {
        *self.slot.write() = Some(token);
    }

    /// Stop attaching a credential.
    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    /// Whether a token is set.
    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl CredentialProvider for TokenCredentials {
    fn access_token(&self) -> Option<AccessToken> {
        self.slot.read().clone()
    }
}
