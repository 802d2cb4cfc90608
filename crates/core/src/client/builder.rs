//! Builder for the resilient client

use std::sync::Arc;

use staleguard_common::time::{Clock, SystemClock};
use staleguard_domain::{ClientConfig, ClientError, Credentials, Result};

use super::service::ResilientApiClient;
use crate::cache::KeyValueStore;
use crate::http::Transport;

/// Builder for [`ResilientApiClient`]
///
/// Configuration, credentials, transport and store are required; the clock
/// defaults to [`SystemClock`].
#[derive(Default)]
pub struct ResilientApiClientBuilder {
    config: Option<ClientConfig>,
    credentials: Option<Credentials>,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ResilientApiClientBuilder {
    /// Set endpoints and fetch policy
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the transport shared by token and resource calls
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the cache engine backing both token and response namespaces
    #[must_use]
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if a required part is missing or an
    /// endpoint URL is blank.
    pub fn build(self) -> Result<ResilientApiClient> {
        let config = self.config.ok_or_else(|| missing("client configuration"))?;
        let credentials = self.credentials.ok_or_else(|| missing("credentials"))?;
        let transport = self.transport.ok_or_else(|| missing("transport"))?;
        let store = self.store.ok_or_else(|| missing("cache store"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        if config.token_url.trim().is_empty() {
            return Err(ClientError::Config("token_url is empty".to_string()));
        }
        if config.resource_base_url.trim().is_empty() {
            return Err(ClientError::Config("resource_base_url is empty".to_string()));
        }

        Ok(ResilientApiClient::new(config, credentials, transport, store, clock))
    }
}

fn missing(part: &str) -> ClientError {
    ClientError::Config(format!("{part} not set"))
}
