//! # Staleguard Core
//!
//! Token lifecycle and resilient fetch logic - no infrastructure
//! dependencies.
//!
//! This crate contains:
//! - Port interfaces for the HTTP transport and the key/value cache
//! - Typed cache namespaces for tokens and last known-good responses
//! - The token manager and the resilient API client
//!
//! ## Architecture Principles
//! - Only depends on `staleguard-common` and `staleguard-domain`
//! - No HTTP client or cache engine code
//! - All external dependencies via traits

pub mod auth;
pub mod cache;
pub mod client;
pub mod http;
pub mod query;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use auth::{TokenEndpoint, TokenManager};
pub use cache::ports::KeyValueStore;
pub use cache::stores::{ResponseStore, TokenStore};
pub use client::{Fetched, PayloadSource, ResilientApiClient, ResilientApiClientBuilder};
pub use http::ports::{FormRequest, GetRequest, HttpResponse, Transport};
pub use query::{FetchRequest, IdFilter, IdFilters, QueryBuilder, Transform};
