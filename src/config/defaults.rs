//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default debounce wait in milliseconds.
pub const WAIT_MS: u64 = 500;

/// Default simulated handler duration in milliseconds.
pub const WORK_MS: u64 = 0;

/// Default debounce wait as Duration.
#[must_use]
pub const fn wait() -> Duration {
    Duration::from_millis(WAIT_MS)
}

/// Default simulated handler duration as Duration.
#[must_use]
pub const fn work() -> Duration {
    Duration::from_millis(WORK_MS)
}
