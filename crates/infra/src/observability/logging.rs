//! Structured logging
//!
//! `RUST_LOG` takes precedence over the configured filter so a single run
//! can be made more verbose without editing configuration.

use staleguard_domain::{ClientError, LoggingConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Resolve the active filter: `RUST_LOG` when set, else the configured one
///
/// # Errors
/// `ClientError::Config` when the configured directive does not parse.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter)
        .map_err(|e| ClientError::Config(format!("invalid log filter '{}': {e}", config.filter)))
}

/// Install the global tracing subscriber
///
/// Logs go to stderr so command output on stdout stays machine-readable.
///
/// # Errors
/// `ClientError::Config` when the filter is invalid or a subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)).try_init()
    };

    installed.map_err(|e| ClientError::Config(format!("tracing already initialised: {e}")))
}
