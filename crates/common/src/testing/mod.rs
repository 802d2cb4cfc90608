//! Testing utilities for deterministic time
//!
//! Enable with the `test-utils` feature from dev-dependencies:
//!
//! ```toml
//! [dev-dependencies]
//! staleguard-common = { workspace = true, features = ["test-utils"] }
//! ```

use chrono::{DateTime, TimeZone, Utc};

mod clock;

pub use clock::MockClock;
pub use crate::time::{Clock, SystemClock};

/// Build a UTC timestamp, panicking on an invalid date
///
/// Test-only convenience; production code never constructs dates this way.
#[must_use]
#[allow(clippy::panic)]
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(year, month, day, hour, minute, second).single() {
        Some(at) => at,
        None => panic!("invalid test timestamp {year}-{month}-{day} {hour}:{minute}:{second}"),
    }
}

/// Mock clock frozen at the given UTC timestamp until advanced
#[must_use]
pub fn clock_at(at: DateTime<Utc>) -> MockClock {
    MockClock::at(at)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_clock_at_reports_wall_time() {
        let start = utc(2024, 1, 31, 23, 59, 0);
        let clock = clock_at(start);
        clock.advance(Duration::from_secs(60));
        assert_eq!(clock.utc_now(), utc(2024, 2, 1, 0, 0, 0));
    }
}
