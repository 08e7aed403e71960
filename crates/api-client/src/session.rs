//! Session lifecycle
//!
//! [`ApiClient`] ties a credential store, a transport and a token refresher
//! together. It owns the session lifecycle (login, refresh, logout) and
//! reports transitions through [`SessionEvent`] callbacks so the UI layer can
//! react, e.g. by sending the user back to the login screen on `Expired`.
//!
//! # Example
//!
//! ```rust,no_run
//! use api_client::{ApiClient, ClientConfig, CredentialPair, HttpRequest, MemoryCredentialStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryCredentialStore::new());
//!     let client = ApiClient::new(ClientConfig::new("http://localhost:8080"), store)?;
//!
//!     client.login(CredentialPair::new("access", "refresh")).await?;
//!
//!     let response = client.fetch(&HttpRequest::get("/api/lessons")).await?;
//!     println!("status: {}", response.status);
//!
//!     Ok(())
//! }
//! ```

use crate::config::ClientConfig;
use crate::credentials::{CredentialPair, CredentialStore};
use crate::fetch::{AuthenticatedFetch, FetchError};
use crate::refresh::{HttpTokenRefresher, RefreshGate, TokenRefresher};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use parking_lot::RwLock;
use std::sync::Arc;

/// Session event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials stored after login
    Created,
    /// Credentials rotated by a token refresh
    Refreshed,
    /// Refresh failed; the stored session can no longer be used
    Expired,
    /// Credentials removed by logout
    LoggedOut,
}

/// Callback function type for session events
pub type SessionCallback = Arc<dyn Fn(SessionEvent) + Send + Sync>;

/// Registry of session event callbacks
#[derive(Clone, Default)]
pub struct SessionEvents {
    callbacks: Arc<RwLock<Vec<SessionCallback>>>,
}

impl SessionEvents {
    /// Register a callback
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        self.callbacks.write().push(Arc::new(callback));
    }

    /// Invoke every registered callback
    pub(crate) fn emit(&self, event: SessionEvent) {
        // Callbacks may subscribe, so they run outside the lock
        let callbacks = self.callbacks.read().clone();
        for callback in callbacks {
            callback(event);
        }
    }
}

/// Authenticated client for the Lingo backend
pub struct ApiClient {
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    fetcher: AuthenticatedFetch,
    events: SessionEvents,
}

impl ApiClient {
    /// Create a client using reqwest and the backend's refresh endpoint
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> crate::Result<Self> {
        config.validate()?;

        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config)?);
        let refresher = Arc::new(HttpTokenRefresher::new(transport.clone(), config.refresh_url()));

        Ok(Self::with_parts(config, store, transport, refresher))
    }

    /// Create a client from explicit collaborators
    pub fn with_parts(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        let events = SessionEvents::default();
        let gate = Arc::new(RefreshGate::new(store.clone(), refresher, events.clone()));
        let fetcher =
            AuthenticatedFetch::new(transport, store.clone(), gate, config.authorization_policy);

        Self { config, store, fetcher, events }
    }

    /// Send a request on behalf of the current session
    ///
    /// See [`AuthenticatedFetch::fetch`].
    pub async fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        self.fetcher.fetch(request).await
    }

    /// Store credentials obtained from a login or sign-up flow
    pub async fn login(&self, pair: CredentialPair) -> crate::Result<()> {
        self.store.save(&pair).await?;
        tracing::info!("session created");
        self.events.emit(SessionEvent::Created);
        Ok(())
    }

    /// Remove the stored credentials
    pub async fn logout(&self) -> crate::Result<()> {
        self.store.clear().await?;
        tracing::info!("session cleared");
        self.events.emit(SessionEvent::LoggedOut);
        Ok(())
    }

    /// Get the stored credentials, if any
    pub async fn credentials(&self) -> crate::Result<Option<CredentialPair>> {
        Ok(self.store.load().await?)
    }

    /// Check whether credentials are stored
    pub async fn is_authenticated(&self) -> crate::Result<bool> {
        Ok(self.store.load().await?.is_some())
    }

    /// Register a callback for session events
    pub fn on_session_event<F>(&self, callback: F)
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(callback);
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
