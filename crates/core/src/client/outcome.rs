//! Result of a successful logical fetch

use serde_json::Value;
use staleguard_domain::ClientError;

/// Where a returned payload came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    /// Decoded from the response just received
    Live,
    /// Last known-good response, served because the live call failed
    Cache { reason: ClientError },
}

/// Transformed payload plus its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub payload: Value,
    pub source: PayloadSource,
}

impl Fetched {
    pub(crate) fn live(payload: Value) -> Self {
        Self { payload, source: PayloadSource::Live }
    }

    pub(crate) fn cached(payload: Value, reason: ClientError) -> Self {
        Self { payload, source: PayloadSource::Cache { reason } }
    }

    /// Whether the payload was served from cache
    pub fn is_stale(&self) -> bool {
        matches!(self.source, PayloadSource::Cache { .. })
    }

    /// Failure that forced the cache fallback
    pub fn fallback_reason(&self) -> Option<&ClientError> {
        match &self.source {
            PayloadSource::Live => None,
            PayloadSource::Cache { reason } => Some(reason),
        }
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }
}
