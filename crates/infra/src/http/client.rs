use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, RequestBuilder};
use staleguard_core::http::ports::Headers;
use staleguard_core::{FormRequest, GetRequest, HttpResponse, Transport};
use staleguard_domain::{Result, TransportError};
use tracing::debug;

use crate::errors::{classify_reqwest_error, InfraError};

/// [`Transport`] backed by a shared reqwest client.
///
/// One attempt per call: retry policy belongs to the resilient client, which
/// only retries auth failures.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        headers: &Headers,
        timeout: Duration,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let builder =
            headers.iter().fold(builder.timeout(timeout), |b, (name, value)| b.header(name, value));

        let response =
            builder.send().await.map_err(|err| classify_reqwest_error(&err, timeout))?;
        let status = response.status().as_u16();
        let url = response.url().clone();
        let body = response.text().await.map_err(|err| classify_reqwest_error(&err, timeout))?;

        debug!(%url, status, bytes = body.len(), "received HTTP response");
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: GetRequest) -> std::result::Result<HttpResponse, TransportError> {
        debug!(url = %request.url, "sending GET");
        let builder = self.client.get(&request.url);
        self.execute(builder, &request.headers, request.timeout).await.map_err(|err| {
            debug!(url = %request.url, error = %err, "GET failed");
            err
        })
    }

    async fn post_form(
        &self,
        request: FormRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        debug!(url = %request.url, "sending form POST");
        let builder = self.client.post(&request.url).form(&request.form);
        self.execute(builder, &request.headers, request.timeout).await.map_err(|err| {
            debug!(url = %request.url, error = %err, "form POST failed");
            err
        })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    use_system_proxy: bool,
}

impl ReqwestTransportBuilder {
    /// Bound on TCP/TLS connection setup, on top of the per-request timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Honour `HTTP(S)_PROXY` settings. Off by default.
    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.use_system_proxy = enabled;
        self
    }

    pub fn build(self) -> Result<ReqwestTransport> {
        let mut builder = ReqwestClient::builder();

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if !self.use_system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(InfraError::from)?;
        Ok(ReqwestTransport { client })
    }
}
