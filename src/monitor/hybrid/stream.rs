//! Hybrid stream implementation.
//!
//! This module provides [`HybridStream`], a stream that combines
//! platform change notifications with periodic polling for reachability
//! monitoring.

use crate::monitor::change::{ChangeDetector, StatusChange};
use crate::monitor::error::ListenError;
use crate::probe::{FlagsProbe, Target};
use crate::time::Clock;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, interval};
use tokio_stream::Stream;

/// Internal state of the hybrid stream.
#[derive(Debug)]
enum StreamState<S> {
    /// Hybrid mode: platform events + polling.
    Hybrid {
        /// The platform notification stream.
        events: S,
    },
    /// Polling-only mode: the listener has failed, polling is the sole
    /// source.
    PollingOnly,
}

/// What triggered the current probe iteration.
#[derive(Debug)]
enum ProbeTrigger {
    /// Platform notification received
    PlatformEvent,
    /// Platform stream ended or errored - degrade
    PlatformDegraded,
    /// Polling interval elapsed
    Interval,
    /// Nothing ready yet
    Pending,
}

impl ProbeTrigger {
    /// Returns a human-readable label for logging.
    const fn label(&self) -> &'static str {
        match self {
            Self::PlatformEvent => "platform event",
            Self::PlatformDegraded => "platform degradation",
            Self::Interval => "polling interval",
            Self::Pending => "pending",
        }
    }
}

/// A stream of status changes produced by hybrid monitoring.
///
/// This type is returned by [`super::HybridMonitor::into_stream`] and
/// yields a [`StatusChange`] whenever the probed flag word differs from
/// the previous reading.
///
/// The stream operates in two modes:
/// - **Hybrid**: Reacts to both platform notifications and the polling
///   interval
/// - **Polling-only**: Falls back to polling if the platform listener
///   fails
///
/// Degradation from hybrid to polling-only is automatic and permanent
/// for the lifetime of this stream.
#[derive(Debug)]
pub struct HybridStream<P, S, C> {
    probe: P,
    target: Target,
    clock: C,
    interval: Interval,
    state: StreamState<S>,
    detector: ChangeDetector,
}

impl<P, S, C> HybridStream<P, S, C>
where
    P: FlagsProbe,
    S: Stream<Item = Result<(), ListenError>> + Unpin,
    C: Clock,
{
    pub(super) fn new(
        probe: P,
        target: Target,
        events: S,
        clock: C,
        poll_interval: Duration,
    ) -> Self {
        Self {
            probe,
            target,
            clock,
            interval: interval(poll_interval),
            state: StreamState::Hybrid { events },
            detector: ChangeDetector::new(),
        }
    }

    /// Returns true if currently in polling-only mode.
    #[must_use]
    pub const fn is_polling_only(&self) -> bool {
        matches!(self.state, StreamState::PollingOnly)
    }

    /// Performs a single probe and feeds it through the change guard.
    fn probe_once(&mut self) -> Option<StatusChange> {
        // Probe errors are swallowed; the next trigger retries.
        let flags = self.probe.probe(&self.target).ok()?;
        self.detector.observe(flags, self.clock.now())
    }

    /// Transitions to polling-only mode.
    fn degrade_to_polling(&mut self) {
        self.state = StreamState::PollingOnly;
    }
}

impl<P, S, C> Stream for HybridStream<P, S, C>
where
    P: FlagsProbe + Unpin,
    S: Stream<Item = Result<(), ListenError>> + Unpin,
    C: Clock + Unpin,
{
    type Item = StatusChange;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let trigger = match &mut self.state {
                StreamState::Hybrid { events } => {
                    // Check the platform stream first (higher priority for
                    // responsiveness)
                    match Pin::new(events).poll_next(cx) {
                        Poll::Ready(Some(Ok(()))) => ProbeTrigger::PlatformEvent,
                        Poll::Ready(Some(Err(_)) | None) => {
                            // Listener failed or ended - will degrade
                            ProbeTrigger::PlatformDegraded
                        }
                        Poll::Pending => {
                            // Listener not ready - check interval
                            if Pin::new(&mut self.interval).poll_tick(cx).is_ready() {
                                ProbeTrigger::Interval
                            } else {
                                ProbeTrigger::Pending
                            }
                        }
                    }
                }
                StreamState::PollingOnly => {
                    // Only check interval in polling-only mode
                    if Pin::new(&mut self.interval).poll_tick(cx).is_ready() {
                        ProbeTrigger::Interval
                    } else {
                        ProbeTrigger::Pending
                    }
                }
            };

            match trigger {
                ProbeTrigger::Pending => return Poll::Pending,
                ProbeTrigger::PlatformDegraded => {
                    // Degrade to polling-only mode
                    self.degrade_to_polling();
                    // Continue loop to check interval
                }
                ProbeTrigger::PlatformEvent | ProbeTrigger::Interval => {
                    tracing::debug!("Probe triggered by {}", trigger.label());

                    if let Some(change) = self.probe_once() {
                        tracing::debug!(
                            "Emitting status change ({}) triggered by {}",
                            change.status,
                            trigger.label()
                        );
                        return Poll::Ready(Some(change));
                    }
                    // No change to emit - loop back to wait for next trigger
                }
            }
        }
    }
}
