//! `staleguard` command-line client
//!
//! Fetches a resource through the resilient client and prints the JSON
//! payload. Served-from-cache results are reported on stderr through the
//! log, so stdout stays machine readable.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use staleguard_core::{FetchRequest, IdFilter, Transform};
use staleguard_domain::AppConfig;
use staleguard_infra::{build_client, config, init_tracing};

#[derive(Parser)]
#[command(name = "staleguard")]
#[command(about = "Resilient OAuth2 API client with last-known-good fallback", long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON); skips the environment and path search
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a resource and print its JSON payload
    Fetch {
        /// Resource path relative to the base URL, or an absolute URL
        path: String,

        /// Cache key for the last known-good payload (defaults to the path)
        #[arg(long)]
        cache_key: Option<String>,

        /// Id filter as field=id1,id2 (repeatable)
        #[arg(long = "filter", value_name = "FIELD=IDS")]
        filters: Vec<IdFilter>,

        /// Query window: today, P<n>D, P<n>W or <n>d
        #[arg(long)]
        interval: Option<String>,

        /// Print only this top-level field of the payload
        #[arg(long)]
        pluck: Option<String>,

        #[arg(long)]
        pretty: bool,
    },
    /// Request a new access token and print its expiry
    Token,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    init_tracing(&config.logging)?;

    let client = build_client(&config)?;

    match cli.command {
        Commands::Fetch { path, cache_key, filters, interval, pluck, pretty } => {
            let mut request = FetchRequest::new(path).with_filters(filters.into_iter().collect());
            if let Some(cache_key) = cache_key {
                request = request.with_cache_key(cache_key);
            }
            if let Some(interval) = interval {
                request = request.with_interval(&interval)?;
            }
            if let Some(field) = pluck {
                request = request.with_transform(Transform::pluck(field));
            }

            let fetched = client
                .fetch_detailed(&request)
                .await
                .with_context(|| format!("no data available for '{}'", request.cache_key()))?;
            if let Some(reason) = fetched.fallback_reason() {
                tracing::info!(reason = reason.label(), "Printing last known-good payload");
            }

            let payload = fetched.into_payload();
            let rendered = if pretty {
                serde_json::to_string_pretty(&payload)?
            } else {
                serde_json::to_string(&payload)?
            };
            emit(&rendered);
        }
        Commands::Token => {
            let token = client
                .token_manager()
                .try_refresh()
                .await
                .context("token request failed")?;
            let line = match token.seconds_until_expiry(Utc::now()) {
                Some(secs) => format!(
                    "token for '{}' expires in {secs}s",
                    client.token_manager().username()
                ),
                None => format!("token for '{}' has no expiry", client.token_manager().username()),
            };
            emit(&line);
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => {
            let config = config::load_from_file(Some(path))?;
            config::validate(&config)?;
            config
        }
        None => config::load()?,
    };
    Ok(config)
}

#[allow(clippy::print_stdout)]
fn emit(line: &str) {
    println!("{line}");
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use staleguard_core::IdFilters;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_arguments_parse() {
        let cli = Cli::try_parse_from([
            "staleguard",
            "--config",
            "staleguard.toml",
            "fetch",
            "/reports",
            "--filter",
            "accountId=a1,a2",
            "--filter",
            "region=eu",
            "--interval",
            "P7D",
            "--pretty",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("staleguard.toml")));
        match cli.command {
            Commands::Fetch { path, filters, interval, pretty, cache_key, pluck } => {
                assert_eq!(path, "/reports");
                assert_eq!(filters.len(), 2);
                assert_eq!(filters[0], IdFilter::new("accountId", ["a1", "a2"]));
                assert_eq!(interval.as_deref(), Some("P7D"));
                assert!(pretty);
                assert!(cache_key.is_none());
                assert!(pluck.is_none());
            }
            Commands::Token => panic!("expected fetch"),
        }
    }

    #[test]
    fn test_malformed_filter_is_rejected() {
        let result = Cli::try_parse_from(["staleguard", "fetch", "/reports", "--filter", "nofield"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_filters_collect_in_order() {
        let filters: IdFilters =
            vec![IdFilter::new("a", ["1"]), IdFilter::new("b", ["2"])].into_iter().collect();
        assert_eq!(filters.iter().map(|f| f.field.as_str()).collect::<Vec<_>>(), ["a", "b"]);
    }
}
