//! Shared key/value cache and its typed namespaces
//!
//! One engine backs two disjoint namespaces: [`TokenStore`] for bearer
//! tokens keyed by username, and [`ResponseStore`] for the last known-good
//! raw response body per caller cache key.

pub mod memory;
pub mod ports;
pub mod stores;

pub use ports::KeyValueStore;
pub use stores::{ResponseStore, TokenStore};
