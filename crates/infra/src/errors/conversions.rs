//! Conversions from external infrastructure errors into domain errors.

use std::time::Duration;

use reqwest::Error as HttpError;
use staleguard_domain::{ClientError, TransportError};

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ClientError);

impl From<InfraError> for ClientError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ClientError> for InfraError {
    fn from(value: ClientError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportError */
/* -------------------------------------------------------------------------- */

/// Classify a reqwest failure as one of the transport's distinguished errors
///
/// `timeout` is the bound that was applied to the request, reported back in
/// milliseconds when the failure was a timeout.
pub fn classify_reqwest_error(err: &HttpError, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return TransportError::Connect(err.to_string());
        }
    }
    TransportError::Request(err.to_string())
}

/// Client construction failures (TLS backend, invalid headers) are
/// configuration problems; anything else is a transport failure.
impl From<HttpError> for InfraError {
    fn from(err: HttpError) -> Self {
        if err.is_builder() {
            return InfraError(ClientError::Config(format!("http client: {err}")));
        }
        InfraError(ClientError::Transport(classify_reqwest_error(&err, Duration::ZERO)))
    }
}

/* -------------------------------------------------------------------------- */
/* config parsing → ClientError::Config */
/* -------------------------------------------------------------------------- */

impl From<toml::de::Error> for InfraError {
    fn from(err: toml::de::Error) -> Self {
        InfraError(ClientError::Config(format!("Invalid TOML format: {err}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(err: serde_json::Error) -> Self {
        InfraError(ClientError::Config(format!("Invalid JSON format: {err}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(err: std::io::Error) -> Self {
        InfraError(ClientError::Config(format!("Failed to read config file: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn test_parse_errors_become_config_errors() {
        let toml_err = toml::from_str::<toml::Table>("not = [valid").unwrap_err();
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

        assert!(matches!(ClientError::from(InfraError::from(toml_err)), ClientError::Config(_)));
        assert!(matches!(ClientError::from(InfraError::from(json_err)), ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_classified_as_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let err = client.get(format!("http://{addr}")).send().await.unwrap_err();

        assert!(matches!(
            classify_reqwest_error(&err, Duration::from_secs(1)),
            TransportError::Connect(_)
        ));
    }
}
