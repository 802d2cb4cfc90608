//! Production wiring of the resilient client

use std::sync::Arc;

use staleguard_common::time::SystemClock;
use staleguard_core::{KeyValueStore, ResilientApiClient};
use staleguard_domain::constants::DEFAULT_USER_AGENT;
use staleguard_domain::{AppConfig, Result};

use crate::cache::{MokaStore, MokaStoreConfig};
use crate::http::ReqwestTransport;

/// Build a client over reqwest and a fresh moka store
///
/// # Errors
/// `ClientError::Config` when the HTTP client cannot be constructed or a
/// required endpoint is blank.
pub fn build_client(config: &AppConfig) -> Result<ResilientApiClient> {
    let store = MokaStore::new(MokaStoreConfig::from(&config.cache));
    build_client_with_store(config, Arc::new(store))
}

/// Build a client over reqwest and a caller-supplied cache engine
///
/// Clients sharing a store share tokens and last known-good responses.
///
/// # Errors
/// Same as [`build_client`].
pub fn build_client_with_store(
    config: &AppConfig,
    store: Arc<dyn KeyValueStore>,
) -> Result<ResilientApiClient> {
    let user_agent = config.client.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
    let transport = ReqwestTransport::builder()
        .user_agent(user_agent)
        .connect_timeout(config.client.request_timeout())
        .system_proxy(config.client.use_system_proxy)
        .build()?;

    ResilientApiClient::builder()
        .config(config.client.clone())
        .credentials(config.credentials.clone())
        .transport(Arc::new(transport))
        .store(store)
        .clock(Arc::new(SystemClock))
        .build()
}
