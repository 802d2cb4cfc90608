//! Query time windows
//!
//! A window is either "the last N days ending now" or "midnight (UTC) to
//! now". Windows are parsed from short interval descriptors:
//!
//! | Input    | Window          |
//! |----------|-----------------|
//! | `today`  | `Today`         |
//! | `P7D`    | `LastDays(7)`   |
//! | `P2W`    | `LastDays(14)`  |
//! | `30d`    | `LastDays(30)`  |

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use thiserror::Error;

/// Timestamp format used for `start`/`end` query parameters
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Longest window a descriptor may ask for (about a century)
pub const MAX_WINDOW_DAYS: u32 = 36_600;

/// Errors that can occur when parsing an interval descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowParseError {
    #[error("empty interval")]
    Empty,

    #[error("unrecognized interval '{0}'")]
    Unrecognized(String),

    #[error("interval '{0}' is out of range")]
    OutOfRange(String),
}

/// Time range covered by a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// `now - n days` up to `now`
    LastDays(u32),
    /// Midnight UTC of the current day up to `now`
    Today,
}

impl TimeWindow {
    /// Resolve the window to `(start, end)` relative to `now`
    ///
    /// Spans longer than [`MAX_WINDOW_DAYS`] are clamped to it, and a start
    /// before the earliest representable instant saturates there.
    #[must_use]
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            Self::LastDays(days) => {
                let start = TimeDelta::try_days(i64::from((*days).min(MAX_WINDOW_DAYS)))
                    .and_then(|span| now.checked_sub_signed(span))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                (start, now)
            }
            Self::Today => {
                let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
                (midnight, now)
            }
        }
    }
}

impl FromStr for TimeWindow {
    type Err = WindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(WindowParseError::Empty);
        }
        if input.eq_ignore_ascii_case("today") {
            return Ok(Self::Today);
        }

        let upper = input.to_ascii_uppercase();
        let (digits, multiplier) = if let Some(rest) = upper.strip_prefix('P') {
            if let Some(n) = rest.strip_suffix('D') {
                (n, 1)
            } else if let Some(n) = rest.strip_suffix('W') {
                (n, 7)
            } else {
                return Err(WindowParseError::Unrecognized(input.to_string()));
            }
        } else if let Some(n) = upper.strip_suffix('D') {
            (n, 1)
        } else {
            return Err(WindowParseError::Unrecognized(input.to_string()));
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WindowParseError::Unrecognized(input.to_string()));
        }

        digits
            .parse::<u32>()
            .ok()
            .and_then(|n| n.checked_mul(multiplier))
            .filter(|days| *days <= MAX_WINDOW_DAYS)
            .map(Self::LastDays)
            .ok_or_else(|| WindowParseError::OutOfRange(input.to_string()))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastDays(days) => write!(f, "P{days}D"),
            Self::Today => write!(f, "today"),
        }
    }
}

/// Format a timestamp the way query parameters expect it
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
