//! Time abstraction for testability.
//!
//! Status-change events carry a timestamp. The [`Clock`] trait lets tests
//! inject controlled time values while production code uses [`SystemClock`].

use std::time::SystemTime;

/// Abstraction over system time.
///
/// # Example
///
/// ```
/// use reachability::time::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// assert!(now >= std::time::SystemTime::UNIX_EPOCH);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// Production clock delegating to [`SystemTime::now()`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
