//! Polling monitor configuration.
//!
//! This module provides [`PollingMonitor`], the builder/configuration
//! struct for creating polling-based reachability monitors.

use super::stream::PollingStream;
use crate::probe::{FlagsProbe, Target};
use crate::time::{Clock, SystemClock};
use std::time::Duration;

/// Polling-based reachability monitor.
///
/// Periodically probes the target's flags and emits a stream of
/// [`crate::monitor::StatusChange`] events whenever the flag word
/// differs from the previous reading.
///
/// # Type Parameters
///
/// * `P` - The [`FlagsProbe`] implementation used for each poll
/// * `C` - The [`Clock`] implementation for timestamps (defaults to
///   [`SystemClock`])
///
/// # Example
///
/// ```ignore
/// use reachability::monitor::PollingMonitor;
/// use reachability::probe::{platform::PlatformProbe, Target};
/// use std::time::Duration;
///
/// let monitor = PollingMonitor::new(
///     PlatformProbe::default(),
///     Target::DefaultRoute,
///     Duration::from_secs(30),
/// );
///
/// let mut stream = monitor.into_stream();
/// while let Some(change) = stream.next().await {
///     println!("{}", change.status);
/// }
/// ```
#[derive(Debug)]
pub struct PollingMonitor<P, C = SystemClock> {
    probe: P,
    target: Target,
    clock: C,
    interval: Duration,
}

impl<P> PollingMonitor<P, SystemClock>
where
    P: FlagsProbe,
{
    /// Creates a new polling monitor with the system clock.
    ///
    /// # Arguments
    ///
    /// * `probe` - The flag probe to poll
    /// * `target` - The target to watch
    /// * `interval` - The interval between polls
    #[must_use]
    pub const fn new(probe: P, target: Target, interval: Duration) -> Self {
        Self::with_clock(probe, target, SystemClock, interval)
    }
}

impl<P, C> PollingMonitor<P, C>
where
    P: FlagsProbe,
    C: Clock,
{
    /// Creates a new polling monitor with a custom clock.
    ///
    /// This constructor allows injecting a mock clock for testing.
    #[must_use]
    pub const fn with_clock(probe: P, target: Target, clock: C, interval: Duration) -> Self {
        Self {
            probe,
            target,
            clock,
            interval,
        }
    }

    /// Returns the configured polling interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the watched target.
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Converts this monitor into a stream of status changes.
    ///
    /// The first poll fires immediately and always yields the initial
    /// state; afterwards the stream yields only on change.
    ///
    /// The stream never terminates on its own; use `take_until` with
    /// a shutdown signal to stop it gracefully.
    #[must_use]
    pub fn into_stream(self) -> PollingStream<P, C> {
        PollingStream::new(self.probe, self.target, self.clock, self.interval)
    }
}
