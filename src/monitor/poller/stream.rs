//! Polling stream implementation.
//!
//! This module provides [`PollingStream`], a stream that periodically
//! probes a target's flags and yields status changes.

use crate::monitor::change::{ChangeDetector, StatusChange};
use crate::probe::{FlagsProbe, Target};
use crate::time::Clock;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, interval};
use tokio_stream::Stream;

/// A stream of status changes produced by polling.
///
/// This type is returned by [`super::PollingMonitor::into_stream`] and
/// yields a [`StatusChange`] whenever the probed flag word differs from
/// the previous reading. The first tick fires immediately, so the
/// initial state is always reported.
#[derive(Debug)]
pub struct PollingStream<P, C> {
    probe: P,
    target: Target,
    clock: C,
    interval: Interval,
    detector: ChangeDetector,
}

impl<P, C> PollingStream<P, C>
where
    P: FlagsProbe,
    C: Clock,
{
    pub(super) fn new(probe: P, target: Target, clock: C, poll_interval: Duration) -> Self {
        Self {
            probe,
            target,
            clock,
            interval: interval(poll_interval),
            detector: ChangeDetector::new(),
        }
    }

    /// Performs a single probe and feeds it through the change guard.
    fn poll_once(&mut self) -> Option<StatusChange> {
        // Probe errors are intentionally swallowed for resilient polling:
        // transient platform errors should not terminate the stream.
        let flags = self.probe.probe(&self.target).ok()?;
        self.detector.observe(flags, self.clock.now())
    }
}

impl<P, C> Stream for PollingStream<P, C>
where
    P: FlagsProbe + Unpin,
    C: Clock + Unpin,
{
    type Item = StatusChange;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            // Poll the interval timer - registers waker for next tick when Pending
            if Pin::new(&mut self.interval).poll_tick(cx).is_pending() {
                return Poll::Pending;
            }

            if let Some(change) = self.poll_once() {
                return Poll::Ready(Some(change));
            }
            // No change to emit - loop back to re-register waker via poll_tick
        }
    }
}
