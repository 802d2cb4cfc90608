//! Password-grant credentials and bearer tokens

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TOKEN_LIFETIME_SECS;
use crate::errors::TokenError;

/// Username/password pair exchanged for a bearer token
///
/// Immutable once the client is constructed. The password never appears in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create a new credential set
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    /// Account name; also the key under which tokens are cached
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token endpoint response body (RFC 6749 section 5.1)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Bearer token with issuance metadata
///
/// Usable only while `now < expires_at`. The client does not enforce this
/// locally; it reacts to the upstream rejecting the token instead.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    issued_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Create a token from its parts
    #[must_use]
    pub fn new(
        value: impl Into<String>,
        issued_at: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self { value: value.into(), issued_at, expires_at }
    }

    /// Build a token from a grant received at `issued_at`
    ///
    /// `expires_at = issued_at + expires_in`, with the default lifetime when
    /// the endpoint omitted `expires_in`.
    ///
    /// # Errors
    /// [`TokenError::MalformedResponse`] for a negative `expires_in` or one
    /// that puts the expiry outside the representable date range.
    pub fn from_grant(grant: TokenGrant, issued_at: DateTime<Utc>) -> Result<Self, TokenError> {
        let lifetime = grant.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        if lifetime < 0 {
            return Err(TokenError::MalformedResponse(format!("negative expires_in: {lifetime}")));
        }
        let expires_at = TimeDelta::try_seconds(lifetime)
            .and_then(|delta| issued_at.checked_add_signed(delta))
            .ok_or_else(|| {
                TokenError::MalformedResponse(format!("expires_in out of range: {lifetime}"))
            })?;

        Ok(Self {
            value: grant.access_token,
            issued_at: Some(issued_at),
            expires_at: Some(expires_at),
        })
    }

    /// Opaque token value for the `Authorization` header
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// `Authorization` header value
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }

    /// Whether the token is still inside its lifetime at `now`
    ///
    /// Tokens with an unknown expiry are assumed usable.
    #[must_use]
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }

    /// Seconds until expiry, negative once expired
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - now).num_seconds())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("svc-reporting", "hunter2");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("svc-reporting"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_token_from_grant_computes_absolute_expiry() {
        let grant = TokenGrant {
            access_token: "abc".to_string(),
            expires_in: Some(1800),
            token_type: Some("Bearer".to_string()),
        };
        let token = Token::from_grant(grant, at(1_000)).unwrap();

        assert_eq!(token.value(), "abc");
        assert_eq!(token.issued_at(), Some(at(1_000)));
        assert_eq!(token.expires_at(), Some(at(2_800)));
        assert_eq!(token.bearer(), "Bearer abc");
    }

    #[test]
    fn test_token_from_grant_without_lifetime_uses_default() {
        let grant: TokenGrant = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        let token = Token::from_grant(grant, at(0)).unwrap();
        assert_eq!(token.expires_at(), Some(at(DEFAULT_TOKEN_LIFETIME_SECS)));
    }

    #[test]
    fn test_token_from_grant_rejects_unrepresentable_lifetimes() {
        let huge: TokenGrant =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":9223372036854775807}"#)
                .unwrap();
        let negative: TokenGrant =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":-1}"#).unwrap();

        assert!(matches!(
            Token::from_grant(huge, at(1_000)),
            Err(TokenError::MalformedResponse(_))
        ));
        assert!(matches!(
            Token::from_grant(negative, at(1_000)),
            Err(TokenError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_token_usability_window() {
        let token = Token::new("abc", Some(at(0)), Some(at(60)));
        assert!(token.is_usable_at(at(59)));
        assert!(!token.is_usable_at(at(60)));
        assert_eq!(token.seconds_until_expiry(at(50)), Some(10));
        assert_eq!(token.seconds_until_expiry(at(70)), Some(-10));

        let open_ended = Token::new("abc", None, None);
        assert!(open_ended.is_usable_at(at(i64::from(u32::MAX))));
        assert_eq!(open_ended.seconds_until_expiry(at(0)), None);
    }

    #[test]
    fn test_token_debug_redacts_value() {
        let token = Token::new("secret-token", None, None);
        assert!(!format!("{token:?}").contains("secret-token"));
    }
}
