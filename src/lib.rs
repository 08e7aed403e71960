//! Lingo mobile client core
//!
//! Wires the durable credential store, the reqwest transport and the token
//! refresher into a ready-to-use [`ApiClient`], and sets up logging.
//!
//! # Example
//!
//! ```rust,no_run
//! use lingo_mobile::{open_client, ClientConfig, HttpRequest, KvConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     lingo_mobile::init_tracing();
//!
//!     let client = open_client(ClientConfig::default(), KvConfig::new("lingo_kv.db"))?;
//!     let response = client.fetch(&HttpRequest::get("/api/lessons")).await?;
//!
//!     if response.is_unauthorized() {
//!         client.logout().await?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use api_client::{
    ApiClient, AuthorizationPolicy, ClientConfig, CredentialPair, CredentialStore, FetchError,
    HttpMethod, HttpRequest, HttpResponse, KvCredentialStore, SessionEvent, TransportError,
};
pub use storage::{KvConfig, KvStore};

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Open the durable store at `kv` and build a client on top of it
///
/// Credentials saved by a previous run are picked up automatically.
pub fn open_client(config: ClientConfig, kv: KvConfig) -> api_client::Result<ApiClient> {
    let kv = KvStore::new(kv).map_err(api_client::StoreError::from)?;
    let store = Arc::new(KvCredentialStore::new(Arc::new(kv)));
    ApiClient::new(config, store)
}

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG`, defaulting to `info`. Calling it more than once is a
/// no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
