//! Domain types and models

pub mod auth;

pub use auth::{Credentials, Token, TokenGrant};
