//! Resilient resource client

pub mod builder;
pub mod outcome;
pub mod service;

pub use builder::ResilientApiClientBuilder;
pub use outcome::{Fetched, PayloadSource};
pub use service::ResilientApiClient;
