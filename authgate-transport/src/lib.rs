//! # authgate-transport
//!
//! The HTTP boundary of the exchange flow.
//!
//! - [`HttpClient`]: `post`/`get` against API paths, failing with a
//!   [`TransportError`] that tells apart "error status received", "no
//!   response" and "request never built"
//! - [`CredentialProvider`]: consulted on every request for the bearer token;
//!   [`TokenCredentials`] is the shared slot the executor fills
//! - [`ReqwestHttpClient`]: the production client
//! - [`MockHttpClient`]: scripted responses and recorded requests for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use authgate_transport::{HttpClient, ReqwestHttpClient, TokenCredentials};
//! use std::sync::Arc;
//!
//! let credentials = TokenCredentials::new();
//! let client = ReqwestHttpClient::new("http://127.0.0.1:8000", Arc::new(credentials.clone()))?;
//! let me = client.get("/users/me").await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod credentials;
pub mod error;
pub mod http;
pub mod mock;

pub use client::{HttpClient, HttpMethod, HttpResponse};
pub use credentials::{CredentialProvider, NoCredentials, TokenCredentials};
pub use error::TransportError;
pub use http::ReqwestHttpClient;
pub use mock::{MockHttpClient, RecordedRequest};
