//! Request descriptors and URL assembly

pub mod builder;
pub mod request;

pub use builder::QueryBuilder;
pub use request::{FetchRequest, IdFilter, IdFilters, Transform};
