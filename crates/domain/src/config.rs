//! Configuration structures

use std::time::Duration;

use serde::Deserialize;

use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_GRANT_TYPE, DEFAULT_LOG_FILTER, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETENTION_HOURS, DEFAULT_TOKEN_TIMEOUT_SECS, MAX_AUTH_RETRIES,
};
use crate::types::Credentials;

/// Complete application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub credentials: Credentials,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Endpoints and fetch policy for the resilient client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// OAuth2 token endpoint (e.g., "https://auth.example.com/oauth/token")
    pub token_url: String,
    /// Base URL that resource paths are appended to
    pub resource_base_url: String,
    #[serde(default = "default_grant_type")]
    pub grant_type: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Connect/read timeout for resource requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_token_timeout_secs")]
    pub token_timeout_secs: u64,
    /// Consecutive 401/403 responses tolerated within one fetch
    #[serde(default = "default_max_auth_retries")]
    pub max_auth_retries: u32,
    /// Retention for every cache entry, tokens included
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Route requests through `HTTP(S)_PROXY` from the environment
    #[serde(default)]
    pub use_system_proxy: bool,
}

impl ClientConfig {
    /// Create a configuration with default policy for the given endpoints
    #[must_use]
    pub fn new(token_url: impl Into<String>, resource_base_url: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            resource_base_url: resource_base_url.into(),
            grant_type: default_grant_type(),
            client_id: None,
            client_secret: None,
            scope: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_timeout_secs: DEFAULT_TOKEN_TIMEOUT_SECS,
            max_auth_retries: MAX_AUTH_RETRIES,
            retention_hours: DEFAULT_RETENTION_HOURS,
            user_agent: None,
            use_system_proxy: false,
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn token_timeout(&self) -> Duration {
        Duration::from_secs(self.token_timeout_secs)
    }

    /// Retention window as a duration
    #[must_use]
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours.saturating_mul(3600))
    }
}

/// Cache engine sizing
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { max_capacity: DEFAULT_CACHE_CAPACITY }
    }
}

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive (e.g., "info" or "staleguard_core=debug")
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter(), json: false }
    }
}

fn default_grant_type() -> String {
    DEFAULT_GRANT_TYPE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_token_timeout_secs() -> u64 {
    DEFAULT_TOKEN_TIMEOUT_SECS
}

fn default_max_auth_retries() -> u32 {
    MAX_AUTH_RETRIES
}

fn default_retention_hours() -> u64 {
    DEFAULT_RETENTION_HOURS
}

fn default_cache_capacity() -> u64 {
    DEFAULT_CACHE_CAPACITY
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
