//! Protocol constants
//!
//! Centralized location for the fixed values that shape the fetch and token
//! lifecycle.

// Auth retry policy
pub const MAX_AUTH_RETRIES: u32 = 5;

// Retention window applied to every cache entry (tokens and responses)
pub const DEFAULT_RETENTION_HOURS: u64 = 72;

// Timeouts. A slow upstream is treated the same as a down upstream.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_TOKEN_TIMEOUT_SECS: u64 = 10;

// Token endpoint
pub const DEFAULT_GRANT_TYPE: &str = "password";
/// Lifetime assumed when the token endpoint omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

// Cache engine sizing
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

// Cache key namespaces
pub const TOKEN_KEY_PREFIX: &str = "token__";
pub const TOKEN_EXPIRES_KEY_PREFIX: &str = "token_expires__";
pub const TOKEN_ISSUED_KEY_PREFIX: &str = "token_issued__";
pub const RESPONSE_KEY_PREFIX: &str = "response__";

// HTTP
pub const ACCEPT_JSON: &str = "application/json";
pub const DEFAULT_USER_AGENT: &str = concat!("staleguard/", env!("CARGO_PKG_VERSION"));

// Query windows
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// Logging
pub const DEFAULT_LOG_FILTER: &str = "info";
