//! Test doubles for the transport and refresher seams
//!
//! Both fakes replay a fixed script and record what they were asked to do,
//! so tests can assert on call counts and on the exact requests sent.

use crate::credentials::CredentialPair;
use crate::refresh::{RefreshError, TokenRefresher};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError, TransportErrorKind};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Transport that answers from a script, in order
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    /// Create a transport that replays `script`
    pub fn new(script: Vec<Result<HttpResponse, TransportError>>) -> Self {
        Self { script: Mutex::new(script.into()), requests: Mutex::new(Vec::new()) }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Authorization header of every request received so far
    pub fn authorization_headers(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .iter()
            .map(|r| r.header_value("Authorization").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request);
        self.script.lock().pop_front().unwrap_or_else(|| {
            Err(TransportError::new(TransportErrorKind::Other, "transport script exhausted"))
        })
    }
}

/// Refresher that answers from a script, in order
pub struct ScriptedRefresher {
    script: Mutex<VecDeque<Result<CredentialPair, RefreshError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRefresher {
    /// Create a refresher that replays `script`
    pub fn new(script: Vec<Result<CredentialPair, RefreshError>>) -> Self {
        Self { script: Mutex::new(script.into()), calls: Mutex::new(Vec::new()) }
    }

    /// Refresh tokens received so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TokenRefresher for ScriptedRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, RefreshError> {
        self.calls.lock().push(refresh_token.to_string());
        self.script.lock().pop_front().unwrap_or_else(|| {
            Err(RefreshError::InvalidResponse("refresh script exhausted".to_string()))
        })
    }
}
