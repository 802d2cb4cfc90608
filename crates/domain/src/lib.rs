//! # Staleguard Domain
//!
//! Domain types shared by every Staleguard crate.
//!
//! This crate contains:
//! - Credential and token types for the password grant
//! - Client, cache and logging configuration structures
//! - The error taxonomy and Result alias
//! - Protocol constants (retry bound, retention window, key prefixes)
//!
//! ## Architecture
//! - No dependencies on other Staleguard crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
