//! Infrastructure error conversions

pub mod conversions;

pub use conversions::{classify_reqwest_error, InfraError};
