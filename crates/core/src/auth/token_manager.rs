//! Token manager for the OAuth2 password grant
//!
//! Manages the bearer token lifecycle:
//! - Exchanges credentials for a token at the token endpoint
//! - Persists the token and its expiry in the [`TokenStore`]
//! - Hands out the cached token on demand
//!
//! Refresh is reactive only. The manager never looks at the expiry to
//! refresh ahead of time; it refreshes when the cache misses or when the
//! resource server rejects the token.

use std::sync::Arc;
use std::time::Duration;

use staleguard_common::time::Clock;
use staleguard_domain::constants::{ACCEPT_JSON, DEFAULT_USER_AGENT};
use staleguard_domain::{ClientConfig, Credentials, Token, TokenError, TokenGrant};
use tracing::{debug, warn};

use crate::cache::TokenStore;
use crate::http::{FormRequest, Transport};

/// Longest token endpoint body kept in a [`TokenError::Rejected`]
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Token endpoint settings
#[derive(Clone, PartialEq, Eq)]
pub struct TokenEndpoint {
    pub url: String,
    pub grant_type: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl TokenEndpoint {
    /// Endpoint settings taken from the client configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            url: config.token_url.clone(),
            grant_type: config.grant_type.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            timeout: config.token_timeout(),
            user_agent: config.user_agent.clone().unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

impl std::fmt::Debug for TokenEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEndpoint")
            .field("url", &self.url)
            .field("grant_type", &self.grant_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Acquires, caches and hands out bearer tokens for one credential set
pub struct TokenManager {
    credentials: Credentials,
    endpoint: TokenEndpoint,
    transport: Arc<dyn Transport>,
    tokens: TokenStore,
    clock: Arc<dyn Clock>,
}

impl TokenManager {
    /// Create a new token manager
    ///
    /// # Arguments
    /// * `credentials` - Username/password exchanged for tokens
    /// * `endpoint` - Token endpoint settings
    /// * `transport` - Transport used for the token POST
    /// * `tokens` - Namespace tokens are cached in
    /// * `clock` - Source of issuance timestamps
    pub fn new(
        credentials: Credentials,
        endpoint: TokenEndpoint,
        transport: Arc<dyn Transport>,
        tokens: TokenStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { credentials, endpoint, transport, tokens, clock }
    }

    /// Account the tokens belong to
    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Cached token, `None` when never fetched or evicted
    pub async fn current_token(&self) -> Option<Token> {
        let token = self.tokens.load(self.username()).await;
        if token.is_none() {
            debug!(username = self.username(), "no cached access token");
        }
        token
    }

    /// Refresh the token, logging any failure
    ///
    /// Failures leave the cached token untouched; they surface later as an
    /// auth failure on the next resource call.
    pub async fn refresh(&self) {
        if let Err(err) = self.try_refresh().await {
            warn!(username = self.username(), error = %err, "access token refresh failed");
        }
    }

    /// Exchange the credentials for a new token and cache it
    ///
    /// # Errors
    /// - [`TokenError::Transport`] when the endpoint could not be reached
    /// - [`TokenError::Rejected`] for any status other than 200
    /// - [`TokenError::MalformedResponse`] when the body is not a token grant
    ///   or its lifetime cannot be represented
    pub async fn try_refresh(&self) -> Result<Token, TokenError> {
        let username = self.username();
        debug!(username, url = %self.endpoint.url, "requesting access token");

        let response = self.transport.post_form(self.token_request()).await?;
        if !response.is_ok() {
            return Err(TokenError::Rejected {
                status: response.status,
                body: response.body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let grant: TokenGrant = serde_json::from_str(&response.body)
            .map_err(|e| TokenError::MalformedResponse(e.to_string()))?;
        if grant.access_token.trim().is_empty() {
            return Err(TokenError::MalformedResponse("empty access_token".to_string()));
        }

        let token = Token::from_grant(grant, self.clock.utc_now())?;
        self.tokens.save(username, &token).await;

        debug!(username, expires_at = ?token.expires_at(), "access token refreshed");
        Ok(token)
    }

    fn token_request(&self) -> FormRequest {
        let mut form = vec![
            ("grant_type".to_string(), self.endpoint.grant_type.clone()),
            ("username".to_string(), self.credentials.username().to_string()),
            ("password".to_string(), self.credentials.password().to_string()),
        ];
        let optional = [
            ("client_id", &self.endpoint.client_id),
            ("client_secret", &self.endpoint.client_secret),
            ("scope", &self.endpoint.scope),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                form.push((name.to_string(), value.clone()));
            }
        }

        FormRequest {
            url: self.endpoint.url.clone(),
            headers: vec![
                ("Accept".to_string(), ACCEPT_JSON.to_string()),
                ("User-Agent".to_string(), self.endpoint.user_agent.clone()),
            ],
            form,
            timeout: self.endpoint.timeout,
        }
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("credentials", &self.credentials)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
