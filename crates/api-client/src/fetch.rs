//! Authenticated fetch
//!
//! Sends a request with the stored bearer token. When the server answers 401
//! the session is refreshed once through the [`RefreshGate`] and the request
//! is retried once with the new token. The retry never refreshes again, so a
//! server that keeps answering 401 costs at most two requests and one
//! refresh per call.
//!
//! A failed refresh is not an error: the caller receives the original 401
//! and decides whether to log the user out.

use crate::config::AuthorizationPolicy;
use crate::credentials::{CredentialStore, StoreError};
use crate::refresh::{RefreshGate, RefreshOutcome};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by [`AuthenticatedFetch::fetch`]
#[derive(Debug, Error)]
pub enum FetchError {
    /// The transport failed; carries the transport's error unchanged
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The credential store backend failed
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),
}

/// Which attempt of a logical call is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

/// What one attempt sent and got back
struct Sent {
    response: HttpResponse,
    /// Stored access token at the time of sending
    access_token: Option<String>,
    /// Whether our bearer header was attached
    injected: bool,
}

/// Bearer-token HTTP wrapper with one-shot refresh-and-retry
pub struct AuthenticatedFetch {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    gate: Arc<RefreshGate>,
    policy: AuthorizationPolicy,
}

impl AuthenticatedFetch {
    /// Create a fetcher
    ///
    /// `gate` must be built over the same `store`.
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        gate: Arc<RefreshGate>,
        policy: AuthorizationPolicy,
    ) -> Self {
        Self { transport, store, gate, policy }
    }

    /// Send `request` on behalf of the current session
    ///
    /// The response is returned exactly as the transport produced it, after
    /// zero or one retry. `request` itself is never modified.
    pub async fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        let ticket = self.gate.ticket();
        let first = self.attempt(request, Attempt::First).await?;

        if !first.response.is_unauthorized() {
            return Ok(first.response);
        }

        if !first.injected && request.header_value("Authorization").is_some() {
            tracing::debug!(url = %request.url, "401 on caller-supplied credentials, not refreshing");
            return Ok(first.response);
        }

        match self.gate.refresh(first.access_token.as_deref(), ticket).await? {
            RefreshOutcome::Refreshed(_) => {
                let retry = self.attempt(request, Attempt::Retry).await?;
                Ok(retry.response)
            }
            RefreshOutcome::Failed(reason) => {
                tracing::debug!(url = %request.url, %reason, "returning original 401");
                Ok(first.response)
            }
        }
    }

    async fn attempt(&self, request: &HttpRequest, attempt: Attempt) -> Result<Sent, FetchError> {
        let access_token = self
            .store
            .load()
            .await?
            .map(|pair| pair.access_token().to_string())
            .filter(|token| !token.is_empty());

        let mut outgoing = request.clone();
        let caller_has_auth = outgoing.header_value("Authorization").is_some();
        let injected = match (&access_token, caller_has_auth, self.policy) {
            (None, _, _) => false,
            (Some(_), true, AuthorizationPolicy::PreserveCaller) => false,
            (Some(token), _, _) => {
                outgoing.remove_header("Authorization");
                outgoing
                    .headers
                    .insert("Authorization".to_string(), format!("Bearer {}", token));
                true
            }
        };

        tracing::debug!(
            method = outgoing.method.as_str(),
            url = %outgoing.url,
            ?attempt,
            injected,
            "sending authenticated request"
        );

        let response = self.transport.send(outgoing).await?;

        Ok(Sent { response, access_token, injected })
    }
}
