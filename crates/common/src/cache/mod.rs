//! In-process caching
//!
//! [`TtlCache`] is a thread-safe map whose entries each carry their own
//! time-to-live. Expiry is measured against an injected [`Clock`], so tests
//! can age entries with `testing::MockClock` instead of sleeping.
//!
//! [`Clock`]: crate::time::Clock

pub mod ttl;

pub use ttl::TtlCache;
