//! Test doubles for the core ports
//!
//! Enable with the `test-utils` feature from dev-dependencies.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use staleguard_domain::TransportError;

use crate::http::{FormRequest, GetRequest, HttpResponse, Transport};

type Scripted = Result<HttpResponse, TransportError>;

/// In-memory transport that replays scripted outcomes and records requests
///
/// Resource GETs pop from the GET script; once it runs dry the fallback
/// outcome is replayed (a connection failure unless set). Token POSTs pop
/// from the token script; once it runs dry a fresh grant is issued
/// (`token-1`, `token-2`, ...), so refreshes succeed by default.
#[derive(Debug)]
pub struct ScriptedTransport {
    gets: Mutex<VecDeque<Scripted>>,
    fallback_get: Mutex<Scripted>,
    posts: Mutex<VecDeque<Scripted>>,
    issued: AtomicUsize,
    get_log: Mutex<Vec<GetRequest>>,
    post_log: Mutex<Vec<FormRequest>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            gets: Mutex::new(VecDeque::new()),
            fallback_get: Mutex::new(Err(TransportError::Connect("no scripted response".into()))),
            posts: Mutex::new(VecDeque::new()),
            issued: AtomicUsize::new(0),
            get_log: Mutex::new(Vec::new()),
            post_log: Mutex::new(Vec::new()),
        }
    }

    /// Queue a resource response
    pub fn push_response(&self, status: u16, body: impl Into<String>) -> &Self {
        self.gets.lock().push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a resource transport failure
    pub fn push_failure(&self, error: TransportError) -> &Self {
        self.gets.lock().push_back(Err(error));
        self
    }

    /// Outcome replayed once the GET script is exhausted
    pub fn set_fallback_response(&self, status: u16, body: impl Into<String>) {
        *self.fallback_get.lock() = Ok(HttpResponse::new(status, body));
    }

    pub fn set_fallback_failure(&self, error: TransportError) {
        *self.fallback_get.lock() = Err(error);
    }

    /// Queue a token endpoint response
    pub fn push_token_response(&self, response: HttpResponse) -> &Self {
        self.posts.lock().push_back(Ok(response));
        self
    }

    /// Queue a token endpoint transport failure
    pub fn push_token_failure(&self, error: TransportError) -> &Self {
        self.posts.lock().push_back(Err(error));
        self
    }

    /// Every resource request seen, in order
    pub fn get_requests(&self) -> Vec<GetRequest> {
        self.get_log.lock().clone()
    }

    /// Every token request seen, in order
    pub fn post_requests(&self) -> Vec<FormRequest> {
        self.post_log.lock().clone()
    }

    pub fn get_count(&self) -> usize {
        self.get_log.lock().len()
    }

    /// Number of token endpoint calls, successful or not
    pub fn refresh_count(&self) -> usize {
        self.post_log.lock().len()
    }

    /// `Authorization` header of every resource request, in order
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.get_log
            .lock()
            .iter()
            .map(|request| {
                request
                    .headers
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
                    .map(|(_, value)| value.clone())
            })
            .collect()
    }

    fn issue_grant(&self) -> HttpResponse {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        HttpResponse::new(200, format!(r#"{{"access_token":"token-{n}","expires_in":3600}}"#))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: GetRequest) -> Result<HttpResponse, TransportError> {
        self.get_log.lock().push(request);
        let next = self.gets.lock().pop_front();
        next.unwrap_or_else(|| self.fallback_get.lock().clone())
    }

    async fn post_form(&self, request: FormRequest) -> Result<HttpResponse, TransportError> {
        self.post_log.lock().push(request);
        let next = self.posts.lock().pop_front();
        next.unwrap_or_else(|| Ok(self.issue_grant()))
    }
}
