//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file into the environment when one exists
//! 2. Attempts to load from environment variables
//! 3. If incomplete, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//! 6. Validates the result
//!
//! ## Environment Variables
//! Required:
//! - `STALEGUARD_TOKEN_URL`: OAuth2 token endpoint
//! - `STALEGUARD_BASE_URL`: Resource base URL
//! - `STALEGUARD_USERNAME` / `STALEGUARD_PASSWORD`: Password-grant credentials
//!
//! Optional:
//! - `STALEGUARD_GRANT_TYPE` (default `password`)
//! - `STALEGUARD_CLIENT_ID`, `STALEGUARD_CLIENT_SECRET`, `STALEGUARD_SCOPE`
//! - `STALEGUARD_REQUEST_TIMEOUT_SECS` (default 5)
//! - `STALEGUARD_TOKEN_TIMEOUT_SECS` (default 10)
//! - `STALEGUARD_MAX_AUTH_RETRIES` (default 5)
//! - `STALEGUARD_RETENTION_HOURS` (default 72)
//! - `STALEGUARD_USER_AGENT`
//! - `STALEGUARD_SYSTEM_PROXY`: honour `HTTP(S)_PROXY` (true/false)
//! - `STALEGUARD_CACHE_CAPACITY` (default 10000)
//! - `STALEGUARD_LOG`: `EnvFilter` directive (default `info`)
//! - `STALEGUARD_LOG_JSON`: JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./staleguard.toml` or `./staleguard.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use staleguard_domain::{
    AppConfig, CacheSettings, ClientConfig, ClientError, Credentials, LoggingConfig, Result,
};
use url::Url;

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["staleguard.toml", "staleguard.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ClientError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or invalid
pub fn load() -> Result<AppConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Could not load .env file"),
    }

    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };

    validate(&config)?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// All required environment variables must be present. Returns an error
/// if any are missing.
///
/// # Errors
/// Returns `ClientError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<AppConfig> {
    let mut client =
        ClientConfig::new(env_var("STALEGUARD_TOKEN_URL")?, env_var("STALEGUARD_BASE_URL")?);
    let credentials =
        Credentials::new(env_var("STALEGUARD_USERNAME")?, env_var("STALEGUARD_PASSWORD")?);

    if let Some(grant_type) = env_opt("STALEGUARD_GRANT_TYPE") {
        client.grant_type = grant_type;
    }
    client.client_id = env_opt("STALEGUARD_CLIENT_ID");
    client.client_secret = env_opt("STALEGUARD_CLIENT_SECRET");
    client.scope = env_opt("STALEGUARD_SCOPE");
    client.user_agent = env_opt("STALEGUARD_USER_AGENT");
    client.use_system_proxy = env_bool("STALEGUARD_SYSTEM_PROXY", false);
    if let Some(secs) = env_parse("STALEGUARD_REQUEST_TIMEOUT_SECS")? {
        client.request_timeout_secs = secs;
    }
    if let Some(secs) = env_parse("STALEGUARD_TOKEN_TIMEOUT_SECS")? {
        client.token_timeout_secs = secs;
    }
    if let Some(retries) = env_parse("STALEGUARD_MAX_AUTH_RETRIES")? {
        client.max_auth_retries = retries;
    }
    if let Some(hours) = env_parse("STALEGUARD_RETENTION_HOURS")? {
        client.retention_hours = hours;
    }

    let mut cache = CacheSettings::default();
    if let Some(capacity) = env_parse("STALEGUARD_CACHE_CAPACITY")? {
        cache.max_capacity = capacity;
    }

    let mut logging = LoggingConfig::default();
    if let Some(filter) = env_opt("STALEGUARD_LOG") {
        logging.filter = filter;
    }
    logging.json = env_bool("STALEGUARD_LOG_JSON", false);

    Ok(AppConfig { client, credentials, cache, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ClientError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ClientError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ClientError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(InfraError::from)?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => Ok(toml::from_str(contents).map_err(InfraError::from)?),
        "json" => Ok(serde_json::from_str(contents).map_err(InfraError::from)?),
        _ => Err(ClientError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Check a loaded configuration for values the client cannot work with
///
/// # Errors
/// Returns `ClientError::Config` for an empty or non-http(s) endpoint URL,
/// empty credentials, or a zero timeout.
pub fn validate(config: &AppConfig) -> Result<()> {
    validate_url("token_url", &config.client.token_url)?;
    validate_url("resource_base_url", &config.client.resource_base_url)?;

    if config.credentials.username().trim().is_empty() {
        return Err(ClientError::Config("credentials.username is empty".to_string()));
    }
    if config.client.grant_type.trim().is_empty() {
        return Err(ClientError::Config("grant_type is empty".to_string()));
    }
    if config.client.request_timeout_secs == 0 {
        return Err(ClientError::Config("request_timeout_secs must be greater than 0".to_string()));
    }
    if config.client.token_timeout_secs == 0 {
        return Err(ClientError::Config("token_timeout_secs must be greater than 0".to_string()));
    }
    if config.client.retention_hours == 0 {
        return Err(ClientError::Config("retention_hours must be greater than 0".to_string()));
    }
    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::Config(format!("{field} is empty")));
    }
    let url = Url::parse(value)
        .map_err(|e| ClientError::Config(format!("{field} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ClientError::Config(format!("{field} must be http(s), got {scheme}"))),
    }
}

/// Get required environment variable
///
/// # Errors
/// Returns `ClientError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| ClientError::Config(format!("Missing required environment variable: {key}")))
}

/// Optional environment variable; blank counts as unset
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ClientError::Config(format!("Invalid {key} '{raw}': {e}")))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
