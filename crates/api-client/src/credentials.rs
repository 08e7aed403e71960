//! Credential storage
//!
//! The access/refresh token pair is modelled as one value and every store
//! reads and writes it as a unit. Two implementations are provided:
//!
//! - [`MemoryCredentialStore`] keeps the pair in process memory
//! - [`KvCredentialStore`] persists it in the sled-backed [`KvStore`]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use storage::{KvError, KvStore};
use thiserror::Error;
use tokio::sync::RwLock;

/// Store key holding the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Store key holding the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Errors raised by a credential store backend
///
/// A missing pair is never an error; it is reported as `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key-value backend error
    #[error("Storage error: {0}")]
    Kv(#[from] KvError),

    /// Backend could not be reached
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for credential store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Access and refresh token issued together
///
/// Token values are redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    access_token: String,
    refresh_token: String,
}

impl CredentialPair {
    /// Create a new credential pair
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }

    /// Get the access token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get the refresh token
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Persisted home of the current session's tokens
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the stored pair, `None` when logged out
    async fn load(&self) -> Result<Option<CredentialPair>>;

    /// Replace the stored pair; both tokens change together
    async fn save(&self, pair: &CredentialPair) -> Result<()>;

    /// Remove both tokens
    async fn clear(&self) -> Result<()>;
}

/// In-process credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    pair: RwLock<Option<CredentialPair>>,
}

impl MemoryCredentialStore {
    /// Create an empty (logged out) store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a pair
    pub fn with_pair(pair: CredentialPair) -> Self {
        Self { pair: RwLock::new(Some(pair)) }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<CredentialPair>> {
        Ok(self.pair.read().await.clone())
    }

    async fn save(&self, pair: &CredentialPair) -> Result<()> {
        *self.pair.write().await = Some(pair.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.pair.write().await = None;
        Ok(())
    }
}

/// Credential store persisted in the key-value store
///
/// Tokens live under [`ACCESS_TOKEN_KEY`] and [`REFRESH_TOKEN_KEY`]. Both keys
/// are read and written in one sled transaction.
#[derive(Clone)]
pub struct KvCredentialStore {
    kv: Arc<KvStore>,
}

impl KvCredentialStore {
    /// Create a credential store on top of an open key-value store
    pub fn new(kv: Arc<KvStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl CredentialStore for KvCredentialStore {
    async fn load(&self) -> Result<Option<CredentialPair>> {
        let values: Vec<Option<String>> =
            self.kv.get_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])?;

        match values.as_slice() {
            [Some(access), Some(refresh)] => Ok(Some(CredentialPair::new(access, refresh))),
            [None, None] => Ok(None),
            _ => {
                tracing::warn!("credential store holds only one token, treating as logged out");
                Ok(None)
            }
        }
    }

    async fn save(&self, pair: &CredentialPair) -> Result<()> {
        self.kv.set_many(&[
            (ACCESS_TOKEN_KEY, &pair.access_token),
            (REFRESH_TOKEN_KEY, &pair.refresh_token),
        ])?;
        self.kv.flush()?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.kv.remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])?;
        self.kv.flush()?;
        Ok(())
    }
}
