//! Client configuration
//!
//! Builder-style configuration for the API client: where the backend lives,
//! where tokens are refreshed, and how the bearer header is attached.

use std::collections::HashMap;
use std::time::Duration;

/// Default backend used by development builds of the app
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Path of the token refresh endpoint, relative to the base URL
pub const DEFAULT_REFRESH_PATH: &str = "/api/auth/token/refresh";

/// What to do when the caller already set an `Authorization` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationPolicy {
    /// Keep the caller's header untouched. A 401 on such a request skips the
    /// token refresh and is returned as-is, since the stored session was not
    /// used. Requests without their own header are still refreshed and
    /// retried.
    #[default]
    PreserveCaller,
    /// Replace the caller's header with the stored bearer token.
    Inject,
}

/// Configuration for [`ApiClient`](crate::ApiClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL used to resolve relative request URLs
    pub base_url: String,
    /// Path of the token refresh endpoint
    pub refresh_path: String,
    /// Per-request timeout applied by the HTTP transport
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Headers added to every request (request headers take precedence)
    pub default_headers: HashMap<String, String>,
    /// Conflict policy for caller-supplied `Authorization` headers
    pub authorization_policy: AuthorizationPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("Lingo-Mobile/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
            authorization_policy: AuthorizationPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    /// Set the refresh endpoint path
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the `Authorization` conflict policy
    pub fn with_authorization_policy(mut self, policy: AuthorizationPolicy) -> Self {
        self.authorization_policy = policy;
        self
    }

    /// Absolute URL of the refresh endpoint
    pub fn refresh_url(&self) -> String {
        join_url(&self.base_url, &self.refresh_path)
    }

    /// Check that the configuration can be used to build a client
    pub fn validate(&self) -> crate::Result<()> {
        reqwest::Url::parse(&self.base_url).map_err(|e| {
            crate::Error::Config(format!("invalid base URL {:?}: {}", self.base_url, e))
        })?;

        if !self.refresh_path.starts_with('/') {
            return Err(crate::Error::Config(format!(
                "refresh path must start with '/': {:?}",
                self.refresh_path
            )));
        }

        Ok(())
    }
}

/// Resolve `url` against `base` unless it is already absolute
pub(crate) fn join_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
}
