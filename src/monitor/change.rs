//! Status change detection.

use std::time::SystemTime;

use crate::flags::{NetworkStatus, ReachabilityFlags};

/// A reachability status change event.
///
/// Carries both the raw flag word and its decoded status so consumers
/// can react to either granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// The flags as read from the platform.
    pub flags: ReachabilityFlags,
    /// The status decoded from `flags`.
    pub status: NetworkStatus,
    /// When the change was observed.
    pub timestamp: SystemTime,
}

impl StatusChange {
    /// Creates a change event, decoding the status from the flags.
    #[must_use]
    pub const fn new(flags: ReachabilityFlags, timestamp: SystemTime) -> Self {
        Self {
            flags,
            status: NetworkStatus::from_flags(flags),
            timestamp,
        }
    }

    /// Returns true if the new state is reachable at all.
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        self.status.is_reachable()
    }
}

/// The previous-flags cache.
///
/// Remembers the single last flag word seen and turns a stream of raw
/// observations into a stream of changes: an observation produces an
/// event only when the flags differ from the previous observation. The
/// first observation always produces an event.
///
/// This is the only state the monitor persists.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeDetector {
    previous: Option<ReachabilityFlags>,
}

impl ChangeDetector {
    /// Creates a detector with no previous observation.
    #[must_use]
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// Feeds one observation through the duplicate-suppression guard.
    ///
    /// Returns `Some` exactly when `flags` differs from the previous
    /// observation (or there was none).
    pub fn observe(
        &mut self,
        flags: ReachabilityFlags,
        timestamp: SystemTime,
    ) -> Option<StatusChange> {
        if self.previous == Some(flags) {
            return None;
        }
        self.previous = Some(flags);
        Some(StatusChange::new(flags, timestamp))
    }

    /// Returns the last observed flags, if any.
    #[must_use]
    pub const fn last_flags(&self) -> Option<ReachabilityFlags> {
        self.previous
    }
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;
