//! Port interfaces for the HTTP transport
//!
//! The transport performs exactly one exchange per call. Connection and
//! timeout failures are reported as [`TransportError`], never as a status
//! code; any response that arrives, whatever its status, is `Ok`.

use std::time::Duration;

use async_trait::async_trait;
use staleguard_domain::TransportError;

/// Request/response headers as ordered name/value pairs
pub type Headers = Vec<(String, String)>;

/// Resource request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub url: String,
    pub headers: Headers,
    /// Bound on connect plus read time
    pub timeout: Duration,
}

/// `application/x-www-form-urlencoded` POST, used for the token endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub url: String,
    pub headers: Headers,
    pub form: Vec<(String, String)>,
    pub timeout: Duration,
}

impl FormRequest {
    /// Look up a form field by name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }
}

// Form bodies carry the password, so only field names are shown
impl std::fmt::Debug for FormRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.form.iter().map(|(key, _)| key.as_str()).collect();
        f.debug_struct("FormRequest")
            .field("url", &self.url)
            .field("form_fields", &fields)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Status code and raw body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    /// Only 200 counts as success
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// 401 or 403
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

/// Outbound HTTP
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET and return whatever status the server answered with
    async fn get(&self, request: GetRequest) -> Result<HttpResponse, TransportError>;

    /// POST a form body and return whatever status the server answered with
    async fn post_form(&self, request: FormRequest) -> Result<HttpResponse, TransportError>;
}
