//! Error types used throughout the client

use thiserror::Error;

/// Failure signalled by the transport instead of a status code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Main error type for Staleguard
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Upstream rejected credentials with status {0}")]
    Auth(u16),

    #[error("Upstream returned an empty payload")]
    EmptyPayload,

    #[error("Upstream returned status {0}")]
    Upstream(u16),

    #[error("Malformed payload: {0}")]
    Decode(String),

    #[error("No access token available for '{0}'")]
    TokenUnavailable(String),

    #[error("No cached data available for '{0}'")]
    CacheUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse categories of [`ClientError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout or connection failure
    Transport,
    /// 401/403 from the upstream, or no token could be obtained
    Auth,
    /// 200 with no usable data
    EmptyPayload,
    /// Any other non-200 status, or an undecodable body
    Upstream,
    /// Fallback requested but nothing cached
    CacheUnavailable,
    /// Caller or configuration mistake
    Input,
}

impl ClientError {
    /// Get the failure category for this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transport,
            Self::Auth(_) | Self::TokenUnavailable(_) => FailureKind::Auth,
            Self::EmptyPayload => FailureKind::EmptyPayload,
            Self::Upstream(_) | Self::Decode(_) => FailureKind::Upstream,
            Self::CacheUnavailable(_) => FailureKind::CacheUnavailable,
            Self::InvalidInput(_) | Self::Config(_) => FailureKind::Input,
        }
    }

    /// Whether the failure is recovered by serving the last known-good response
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.kind(), FailureKind::CacheUnavailable | FailureKind::Input)
    }

    /// Stable label suitable for log fields
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transport(TransportError::Timeout(_)) => "timeout",
            Self::Transport(_) => "transport",
            Self::Auth(_) => "auth",
            Self::EmptyPayload => "empty_payload",
            Self::Upstream(_) => "upstream",
            Self::Decode(_) => "decode",
            Self::TokenUnavailable(_) => "token_unavailable",
            Self::CacheUnavailable(_) => "cache_unavailable",
            Self::InvalidInput(_) => "invalid_input",
            Self::Config(_) => "config",
        }
    }
}

/// Token endpoint failures
///
/// These never reach callers of the fetch path; they are logged by the
/// token manager and leave the token store untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("token endpoint returned status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed token response: {0}")]
    MalformedResponse(String),
}

/// Result type alias for Staleguard operations
pub type Result<T> = std::result::Result<T, ClientError>;
