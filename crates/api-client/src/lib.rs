//! Lingo API client
//!
//! This crate provides authenticated access to the Lingo backend: a bearer
//! token is attached to every request, and an expired access token is
//! refreshed once and the request retried, without callers having to handle
//! token expiry themselves.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod credentials;
pub mod fetch;
pub mod refresh;
pub mod session;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use config::{AuthorizationPolicy, ClientConfig};
pub use credentials::{
    CredentialPair, CredentialStore, KvCredentialStore, MemoryCredentialStore, StoreError,
};
pub use fetch::{AuthenticatedFetch, FetchError};
pub use refresh::{HttpTokenRefresher, RefreshError, RefreshGate, RefreshOutcome, TokenRefresher};
pub use session::{ApiClient, SessionCallback, SessionEvent, SessionEvents};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError,
    TransportErrorKind,
};

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for client construction and session operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credential store error
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),
}
