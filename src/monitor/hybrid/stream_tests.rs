//! Tests for `HybridStream` behavior.

use super::monitor::HybridMonitor;
use super::test_fixtures::{MockClock, MockEventStream, MockListener, MockProbe};
use crate::flags::{NetworkStatus, ReachabilityFlags};
use crate::monitor::error::ListenError;
use crate::probe::{ProbeError, Target};
use std::time::Duration;
use tokio_stream::StreamExt;

#[tokio::test]
async fn platform_event_triggers_immediate_probe() {
    let probe = MockProbe::returning_flags(vec![ReachabilityFlags::REACHABLE]);
    // One event, then pending; a long interval keeps polling out of the way.
    let listener = MockListener::new(vec![Some(Ok(()))]);
    let monitor = HybridMonitor::with_clock(
        probe,
        Target::DefaultRoute,
        listener,
        MockClock::new(0),
        Duration::from_secs(3600),
    );

    let changes: Vec<_> = monitor.into_stream().take(1).collect().await;

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].status, NetworkStatus::ReachableViaWifi);
}

#[tokio::test]
async fn duplicate_readings_after_events_are_suppressed() {
    let probe = MockProbe::returning_flags(vec![
        ReachabilityFlags::REACHABLE,
        ReachabilityFlags::REACHABLE,
        ReachabilityFlags::empty(),
    ]);
    let listener = MockListener::new(vec![Some(Ok(())), Some(Ok(())), Some(Ok(()))]);
    let monitor = HybridMonitor::with_clock(
        probe,
        Target::DefaultRoute,
        listener,
        MockClock::new(0),
        Duration::from_secs(3600),
    );

    let changes: Vec<_> = monitor.into_stream().take(2).collect().await;

    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].status, NetworkStatus::ReachableViaWifi);
    assert_eq!(changes[1].status, NetworkStatus::NotReachable);
}

#[tokio::test(start_paused = true)]
async fn listener_error_degrades_to_polling() {
    let monitor = HybridMonitor::with_clock(
        MockProbe::returning_flags(vec![ReachabilityFlags::REACHABLE]),
        Target::DefaultRoute,
        MockListener::failing(),
        MockClock::new(0),
        Duration::from_millis(10),
    );

    let mut stream = monitor.into_stream();

    // The failed listener degrades the stream, and polling still
    // delivers the state.
    let change = stream.next().await;
    assert!(change.is_some());
    assert!(stream.is_polling_only());
}

#[tokio::test(start_paused = true)]
async fn ended_listener_stream_degrades_to_polling() {
    let monitor = HybridMonitor::with_clock(
        MockProbe::returning_flags(vec![ReachabilityFlags::REACHABLE]),
        Target::DefaultRoute,
        MockListener::new(vec![None]),
        MockClock::new(0),
        Duration::from_millis(10),
    );

    let mut stream = monitor.into_stream();

    assert!(stream.next().await.is_some());
    assert!(stream.is_polling_only());
}

#[tokio::test(start_paused = true)]
async fn pending_listener_falls_back_to_interval() {
    let monitor = HybridMonitor::with_clock(
        MockProbe::returning_flags(vec![
            ReachabilityFlags::REACHABLE,
            ReachabilityFlags::empty(),
        ]),
        Target::DefaultRoute,
        MockListener::pending(),
        MockClock::new(0),
        Duration::from_millis(10),
    );

    let mut stream = monitor.into_stream();

    let first = stream.next().await.unwrap();
    let second = stream.next().await.unwrap();

    assert_eq!(first.status, NetworkStatus::ReachableViaWifi);
    assert_eq!(second.status, NetworkStatus::NotReachable);
    // The listener never failed, so the stream is still hybrid.
    assert!(!stream.is_polling_only());
}

#[tokio::test(start_paused = true)]
async fn probe_errors_do_not_terminate_the_stream() {
    let monitor = HybridMonitor::with_clock(
        MockProbe::new(vec![
            Err(ProbeError::Platform {
                message: "transient error".to_string(),
            }),
            Ok(ReachabilityFlags::REACHABLE),
        ]),
        Target::DefaultRoute,
        MockListener::pending(),
        MockClock::new(0),
        Duration::from_millis(10),
    );

    let changes: Vec<_> = monitor.into_stream().take(1).collect().await;

    assert_eq!(changes.len(), 1);
    assert!(changes[0].is_reachable());
}

#[tokio::test(start_paused = true)]
async fn degraded_stream_keeps_polling_after_error_event() {
    let listener = MockListener::new(vec![Some(Err(ListenError::Stopped))]);
    let monitor = HybridMonitor::with_clock(
        MockProbe::returning_flags(vec![
            ReachabilityFlags::REACHABLE,
            ReachabilityFlags::empty(),
        ]),
        Target::DefaultRoute,
        listener,
        MockClock::new(0),
        Duration::from_millis(10),
    );

    let mut stream = monitor.into_stream();

    let changes = [
        stream.next().await.unwrap(),
        stream.next().await.unwrap(),
    ];

    assert_eq!(changes[0].status, NetworkStatus::ReachableViaWifi);
    assert_eq!(changes[1].status, NetworkStatus::NotReachable);
}

#[tokio::test]
async fn event_stream_fixture_honors_termination_marker() {
    let mut stream = MockEventStream::new(vec![Some(Ok(())), None]);

    assert!(matches!(stream.next().await, Some(Ok(()))));
    assert!(stream.next().await.is_none());
}
