//! Key-value store for session data and device settings
//!
//! This module provides a small, type-safe key-value store on top of sled.
//! Values are stored as JSON. Groups of keys that must change together are
//! read and written through sled transactions, so a reader never observes a
//! group half-updated.

use serde::{de::DeserializeOwned, Serialize};
use sled::transaction::{ConflictableTransactionResult, TransactionError};
use sled::{Db, IVec};
use std::sync::Arc;
use thiserror::Error;

/// Key-value store error types
#[derive(Debug, Error)]
pub enum KvError {
    /// Sled database error
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Multi-key transaction was aborted
    #[error("Transaction aborted: {0}")]
    Transaction(String),
}

impl From<TransactionError<()>> for KvError {
    fn from(err: TransactionError<()>) -> Self {
        match err {
            TransactionError::Abort(()) => KvError::Transaction("aborted by caller".to_string()),
            TransactionError::Storage(e) => KvError::Database(e),
        }
    }
}

/// Result type for key-value operations
pub type Result<T> = std::result::Result<T, KvError>;

/// Key-value store configuration
#[derive(Debug, Clone)]
pub struct KvConfig {
    /// Database path
    pub path: String,
    /// Cache capacity in bytes
    pub cache_capacity: u64,
    /// Enable compression
    pub use_compression: bool,
    /// Flush interval in milliseconds (None for flushing only on demand)
    pub flush_every_ms: Option<u64>,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            path: "lingo_kv.db".to_string(),
            cache_capacity: 8 * 1024 * 1024, // 8MB
            use_compression: true,
            flush_every_ms: Some(500),
        }
    }
}

impl KvConfig {
    /// Create a new configuration with a custom path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Set cache capacity in bytes
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Enable or disable compression
    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Set flush interval in milliseconds
    pub fn flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }
}

/// Durable key-value store
#[derive(Clone)]
pub struct KvStore {
    db: Arc<Db>,
}

impl KvStore {
    /// Open (or create) a key-value store with configuration
    pub fn new(config: KvConfig) -> Result<Self> {
        let db_config = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression)
            .flush_every_ms(config.flush_every_ms);

        let db = db_config.open()?;
        tracing::debug!(path = %config.path, recovered = db.was_recovered(), "opened kv store");

        Ok(Self { db: Arc::new(db) })
    }

    /// Create an in-memory key-value store (for testing)
    pub fn in_memory() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a value by key
    pub fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value by key
    pub fn set<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;
        self.db.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    /// Remove a value by key, returning whether it existed
    pub fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.db.remove(key.as_bytes())?.is_some())
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.db.contains_key(key.as_bytes())?)
    }

    /// Read several keys from one consistent snapshot
    ///
    /// The returned vector has one entry per requested key, in order.
    pub fn get_many<T>(&self, keys: &[&str]) -> Result<Vec<Option<T>>>
    where
        T: DeserializeOwned,
    {
        let raw = self.db.transaction(
            |tx| -> ConflictableTransactionResult<Vec<Option<IVec>>, ()> {
                let mut values = Vec::with_capacity(keys.len());
                for key in keys {
                    values.push(tx.get(key.as_bytes())?);
                }
                Ok(values)
            },
        )?;

        let mut decoded = Vec::with_capacity(raw.len());
        for value in raw {
            decoded.push(match value {
                Some(bytes) => Some(serde_json::from_slice(&bytes)?),
                None => None,
            });
        }
        Ok(decoded)
    }

    /// Write several keys in one transaction
    ///
    /// Either every key is written or none is.
    pub fn set_many<T>(&self, items: &[(&str, &T)]) -> Result<()>
    where
        T: Serialize,
    {
        let mut encoded = Vec::with_capacity(items.len());
        for (key, value) in items {
            encoded.push((*key, serde_json::to_vec(value)?));
        }

        self.db
            .transaction(|tx| -> ConflictableTransactionResult<(), ()> {
                for (key, bytes) in &encoded {
                    tx.insert(key.as_bytes(), bytes.as_slice())?;
                }
                Ok(())
            })?;
        Ok(())
    }

    /// Remove several keys in one transaction, returning how many existed
    pub fn remove_many(&self, keys: &[&str]) -> Result<usize> {
        let removed = self
            .db
            .transaction(|tx| -> ConflictableTransactionResult<usize, ()> {
                let mut count = 0;
                for key in keys {
                    if tx.remove(key.as_bytes())?.is_some() {
                        count += 1;
                    }
                }
                Ok(count)
            })?;
        Ok(removed)
    }

    /// Clear all data
    pub fn clear(&self) -> Result<()> {
        self.db.clear()?;
        Ok(())
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Get the number of keys in the store
    pub fn len(&self) -> usize {
        self.db.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}
