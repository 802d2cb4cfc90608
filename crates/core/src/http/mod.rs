//! HTTP transport boundary

pub mod ports;

pub use ports::{FormRequest, GetRequest, HttpResponse, Transport};
