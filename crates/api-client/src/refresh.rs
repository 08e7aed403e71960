//! Token refresh
//!
//! [`TokenRefresher`] exchanges a refresh token for a new credential pair.
//! [`RefreshGate`] makes sure concurrent callers that hit an expired access
//! token share one refresh instead of each rotating the tokens on their own.

use crate::credentials::{CredentialPair, CredentialStore, StoreError};
use crate::session::{SessionEvent, SessionEvents};
use crate::transport::{HttpRequest, Transport, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Why a refresh did not produce new credentials
///
/// This is an expected outcome, not a failure of the calling request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// No refresh token is stored
    #[error("No refresh token stored")]
    MissingRefreshToken,

    /// Refresh endpoint answered with a non-2xx status
    #[error("Refresh rejected with status {0}")]
    Rejected(u16),

    /// Refresh request could not be encoded
    #[error("Invalid refresh request: {0}")]
    InvalidRequest(String),

    /// Refresh endpoint answered 2xx with an unusable body
    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),

    /// Refresh request never got a response
    #[error("Refresh request failed: {0}")]
    Transport(#[from] TransportError),
}

/// Remote endpoint that rotates the token pair
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange `refresh_token` for a new pair. Each call may rotate both tokens.
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, RefreshError>;
}

/// Refresh request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Refresh response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
}

/// Refresher that POSTs to the backend's token endpoint
pub struct HttpTokenRefresher {
    transport: Arc<dyn Transport>,
    refresh_url: String,
}

impl HttpTokenRefresher {
    /// Create a refresher for `refresh_url`
    pub fn new(transport: Arc<dyn Transport>, refresh_url: impl Into<String>) -> Self {
        Self { transport, refresh_url: refresh_url.into() }
    }

    /// Get the refresh endpoint URL
    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, RefreshError> {
        let request = HttpRequest::post(self.refresh_url.as_str())
            .json_body(&RefreshRequest { refresh_token })
            .map_err(|e| RefreshError::InvalidRequest(e.to_string()))?;

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(RefreshError::Rejected(response.status));
        }

        let body: RefreshResponse =
            response.json().map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        if body.access_token.is_empty() || body.refresh_token.is_empty() {
            return Err(RefreshError::InvalidResponse("empty token in response".to_string()));
        }

        Ok(CredentialPair::new(body.access_token, body.refresh_token))
    }
}

/// Result of passing through the refresh gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fresh credentials are stored and should be used for the retry
    Refreshed(CredentialPair),
    /// No usable credentials; the caller keeps its original response
    Failed(RefreshError),
}

/// Snapshot of the refresh generation taken when a request starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

#[derive(Debug)]
struct FailedRefresh {
    stale_access_token: Option<String>,
    error: RefreshError,
}

/// Single-flight refresh coordinator, one per credential store
///
/// Callers that saw a 401 queue on one lock. Whoever gets the lock first
/// performs the refresh and persists the result; callers queued behind it
/// see the rotated pair in the store (or the recorded failure) and return
/// without another network call.
pub struct RefreshGate {
    store: Arc<dyn CredentialStore>,
    refresher: Arc<dyn TokenRefresher>,
    events: SessionEvents,
    generation: AtomicU64,
    last_failure: Mutex<Option<FailedRefresh>>,
}

impl RefreshGate {
    /// Create a gate for `store`
    pub fn new(
        store: Arc<dyn CredentialStore>,
        refresher: Arc<dyn TokenRefresher>,
        events: SessionEvents,
    ) -> Self {
        Self {
            store,
            refresher,
            events,
            generation: AtomicU64::new(0),
            last_failure: Mutex::new(None),
        }
    }

    /// Take a ticket before sending the first attempt of a request
    pub fn ticket(&self) -> RefreshTicket {
        RefreshTicket(self.generation.load(Ordering::Acquire))
    }

    /// Obtain credentials newer than `stale_access_token`
    ///
    /// `stale_access_token` is the token the rejected request was sent with.
    /// Store backend errors propagate; refresh failures are an outcome.
    pub async fn refresh(
        &self,
        stale_access_token: Option<&str>,
        ticket: RefreshTicket,
    ) -> Result<RefreshOutcome, StoreError> {
        let mut last_failure = self.last_failure.lock().await;

        let current = self.store.load().await?;
        // An empty stored token was never sent, so it compares as absent
        if let Some(pair) = &current {
            let current_access_token = Some(pair.access_token()).filter(|token| !token.is_empty());
            if current_access_token != stale_access_token {
                tracing::debug!("credentials rotated while waiting, skipping refresh");
                return Ok(RefreshOutcome::Refreshed(pair.clone()));
            }
        }

        if self.generation.load(Ordering::Acquire) != ticket.0 {
            if let Some(failure) = last_failure.as_ref() {
                if failure.stale_access_token.as_deref() == stale_access_token {
                    tracing::debug!("reusing outcome of concurrent failed refresh");
                    return Ok(RefreshOutcome::Failed(failure.error.clone()));
                }
            }
        }

        let Some(pair) = current else {
            tracing::warn!("no refresh token stored, session cannot be refreshed");
            self.events.emit(SessionEvent::Expired);
            return Ok(RefreshOutcome::Failed(RefreshError::MissingRefreshToken));
        };

        self.generation.fetch_add(1, Ordering::AcqRel);
        *last_failure = None;

        match self.refresher.refresh(pair.refresh_token()).await {
            Ok(new_pair) => {
                self.store.save(&new_pair).await?;
                tracing::info!("access token refreshed");
                self.events.emit(SessionEvent::Refreshed);
                Ok(RefreshOutcome::Refreshed(new_pair))
            }
            Err(error) => {
                tracing::warn!(%error, "token refresh failed");
                *last_failure = Some(FailedRefresh {
                    stale_access_token: stale_access_token.map(str::to_string),
                    error: error.clone(),
                });
                self.events.emit(SessionEvent::Expired);
                Ok(RefreshOutcome::Failed(error))
            }
        }
    }
}
