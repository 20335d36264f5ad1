//! Shared test fixtures for hybrid monitor tests.

use crate::flags::ReachabilityFlags;
use crate::monitor::error::ListenError;
use crate::monitor::listener::ChangeListener;
use crate::probe::{FlagsProbe, ProbeError, Target};
use crate::time::Clock;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime};
use tokio_stream::Stream;

/// Mock clock for testing that returns controlled time values.
pub struct MockClock {
    secs: AtomicU64,
}

impl MockClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            secs: AtomicU64::new(initial_secs),
        }
    }
}

impl Clock for MockClock {
    fn now(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.secs.load(Ordering::SeqCst))
    }
}

/// Mock probe that plays back a script of results.
///
/// Once the script is exhausted, the final entry's flags are repeated so
/// long-running streams settle rather than flapping.
pub struct MockProbe {
    script: Mutex<VecDeque<Result<ReachabilityFlags, ProbeError>>>,
    last: Mutex<ReachabilityFlags>,
}

impl MockProbe {
    pub fn new(script: Vec<Result<ReachabilityFlags, ProbeError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(ReachabilityFlags::empty()),
        }
    }

    pub fn returning_flags(flags: Vec<ReachabilityFlags>) -> Self {
        Self::new(flags.into_iter().map(Ok).collect())
    }
}

impl FlagsProbe for MockProbe {
    fn probe(&self, _target: &Target) -> Result<ReachabilityFlags, ProbeError> {
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(flags)) => {
                *self.last.lock().unwrap() = flags;
                Ok(flags)
            }
            Some(Err(error)) => Err(error),
            None => Ok(*self.last.lock().unwrap()),
        }
    }
}

/// Mock platform stream with controllable behavior for testing.
///
/// This implementation is designed to work correctly with tokio's
/// polling model:
/// - `Pending` is produced once the queue is empty (stream stays open)
/// - `None` in the queue explicitly terminates the stream
pub struct MockEventStream {
    /// Queue of events to return. None means stream ends.
    events: Mutex<VecDeque<Option<Result<(), ListenError>>>>,
}

impl MockEventStream {
    pub fn new(events: Vec<Option<Result<(), ListenError>>>) -> Self {
        Self {
            events: Mutex::new(events.into()),
        }
    }
}

impl Stream for MockEventStream {
    type Item = Result<(), ListenError>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // Note: no waker registration - tests rely on the interval timer
        // for wakeups. This works because HybridStream always has polling
        // as a fallback trigger.
        let mut events = self.events.lock().unwrap();
        match events.pop_front() {
            Some(Some(result)) => Poll::Ready(Some(result)),
            Some(None) => Poll::Ready(None), // Stream ended
            None => Poll::Pending,           // No more events, stay pending
        }
    }
}

/// Mock platform listener that produces a controllable stream.
pub struct MockListener {
    events: Vec<Option<Result<(), ListenError>>>,
}

impl MockListener {
    /// Create a listener with specific events. Use None to signal stream
    /// end.
    pub fn new(events: Vec<Option<Result<(), ListenError>>>) -> Self {
        Self { events }
    }

    /// Listener that immediately degrades (platform error).
    pub fn failing() -> Self {
        Self {
            events: vec![Some(Err(ListenError::Stopped))],
        }
    }

    /// Listener that stays pending (for polling-only tests).
    pub fn pending() -> Self {
        Self { events: vec![] }
    }
}

impl ChangeListener for MockListener {
    type Stream = MockEventStream;

    fn into_stream(self) -> Self::Stream {
        MockEventStream::new(self.events)
    }
}
