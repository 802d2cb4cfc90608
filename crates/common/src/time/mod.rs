//! Time utilities and abstractions
//!
//! - **[`clock`]**: the clock abstraction and the system clock
//! - **[`window`]**: query time windows and timestamp formatting

pub mod clock;
pub mod window;

// Re-export commonly used items
pub use clock::{Clock, SystemClock};
pub use window::{
    format_timestamp, TimeWindow, WindowParseError, MAX_WINDOW_DAYS, TIMESTAMP_FORMAT,
};
