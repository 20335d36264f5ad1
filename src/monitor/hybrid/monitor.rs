//! Hybrid monitor configuration.
//!
//! This module provides [`HybridMonitor`], the builder/configuration
//! struct for creating hybrid reachability monitors that combine
//! platform change events with polling.

use super::stream::HybridStream;
use crate::monitor::listener::ChangeListener;
use crate::probe::{FlagsProbe, Target};
use crate::time::{Clock, SystemClock};
use std::time::Duration;

/// Hybrid reachability monitor combining platform events with a polling
/// safety net.
///
/// Platform notifications trigger an immediate re-probe of the target;
/// the interval catches anything the native facility misses.
///
/// # Degradation Behavior
///
/// If the platform listener fails (returns an error), the monitor
/// automatically degrades to polling-only mode. This degradation is
/// permanent for the lifetime of the stream - no automatic recovery is
/// attempted.
///
/// # Type Parameters
///
/// * `P` - The [`FlagsProbe`] implementation used for each re-probe
/// * `L` - The [`ChangeListener`] implementation for platform events
/// * `C` - The [`Clock`] implementation for timestamps (defaults to
///   [`SystemClock`])
///
/// # Example
///
/// ```ignore
/// use reachability::monitor::HybridMonitor;
/// use reachability::monitor::platform::PlatformListener;
/// use reachability::probe::{platform::PlatformProbe, Target};
/// use std::time::Duration;
///
/// let listener = PlatformListener::new()?;
/// let monitor = HybridMonitor::new(
///     PlatformProbe::default(),
///     Target::DefaultRoute,
///     listener,
///     Duration::from_secs(60),
/// );
///
/// let mut stream = monitor.into_stream();
/// while let Some(change) = stream.next().await {
///     println!("{}", change.status);
/// }
/// ```
#[derive(Debug)]
pub struct HybridMonitor<P, L, C = SystemClock> {
    probe: P,
    target: Target,
    listener: L,
    clock: C,
    poll_interval: Duration,
}

impl<P, L> HybridMonitor<P, L, SystemClock>
where
    P: FlagsProbe,
    L: ChangeListener,
{
    /// Creates a new hybrid monitor with the system clock.
    ///
    /// # Arguments
    ///
    /// * `probe` - The flag probe used on every trigger
    /// * `target` - The target to watch
    /// * `listener` - The platform listener for change events
    /// * `poll_interval` - The safety-net polling interval
    #[must_use]
    pub const fn new(probe: P, target: Target, listener: L, poll_interval: Duration) -> Self {
        Self::with_clock(probe, target, listener, SystemClock, poll_interval)
    }
}

impl<P, L, C> HybridMonitor<P, L, C>
where
    P: FlagsProbe,
    L: ChangeListener,
    C: Clock,
{
    /// Creates a new hybrid monitor with a custom clock.
    ///
    /// This constructor allows injecting a mock clock for testing.
    #[must_use]
    pub const fn with_clock(
        probe: P,
        target: Target,
        listener: L,
        clock: C,
        poll_interval: Duration,
    ) -> Self {
        Self {
            probe,
            target,
            listener,
            clock,
            poll_interval,
        }
    }

    /// Returns the configured polling interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the watched target.
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Converts this monitor into a stream of status changes.
    ///
    /// The returned stream will:
    /// - Re-probe immediately on platform change events
    /// - Poll at the configured interval as a safety net
    /// - Yield a [`crate::monitor::StatusChange`] whenever the flag word
    ///   differs from the previous reading
    ///
    /// If the platform listener fails, the stream automatically degrades
    /// to polling-only mode without terminating.
    ///
    /// The stream never terminates on its own; use `take_until` with
    /// a shutdown signal to stop it gracefully.
    #[must_use]
    pub fn into_stream(self) -> HybridStream<P, L::Stream, C> {
        let events = self.listener.into_stream();
        HybridStream::new(self.probe, self.target, events, self.clock, self.poll_interval)
    }
}
