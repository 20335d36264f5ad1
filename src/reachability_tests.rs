//! Tests for the reachability handle.

use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Mock probe that plays back a script of results.
///
/// Once the script is exhausted, the final entry's flags are repeated.
struct MockProbe {
    script: Mutex<VecDeque<Result<ReachabilityFlags, ProbeError>>>,
    last: Mutex<ReachabilityFlags>,
}

impl MockProbe {
    fn new(script: Vec<Result<ReachabilityFlags, ProbeError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(ReachabilityFlags::empty()),
        }
    }

    fn returning_flags(flags: Vec<ReachabilityFlags>) -> Self {
        Self::new(flags.into_iter().map(Ok).collect())
    }

    fn always(flags: ReachabilityFlags) -> Self {
        Self::returning_flags(vec![flags])
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

/// Probe whose flags can be switched from the test body.
struct SwitchProbe {
    flags: Mutex<ReachabilityFlags>,
}

impl SwitchProbe {
    fn new(flags: ReachabilityFlags) -> Self {
        Self {
            flags: Mutex::new(flags),
        }
    }

    fn set(&self, flags: ReachabilityFlags) {
        *self.flags.lock().unwrap() = flags;
    }
}

impl FlagsProbe for SwitchProbe {
    fn probe(&self, _target: &Target) -> Result<ReachabilityFlags, ProbeError> {
        Ok(*self.flags.lock().unwrap())
    }
}

fn handle_with(probe: Arc<dyn FlagsProbe>) -> Reachability {
    Reachability::with_probe(Target::DefaultRoute, probe).unwrap()
}

mod construction {
    use super::*;

    #[test]
    fn empty_hostname_is_rejected() {
        let result = Reachability::with_probe(
            Target::Host(String::new()),
            Arc::new(MockProbe::always(ReachabilityFlags::empty())),
        );

        assert!(matches!(
            result,
            Err(ReachabilityError::FailedToCreateWithHostname { .. })
        ));
    }

    #[test]
    fn hostname_with_whitespace_is_rejected() {
        let result = Reachability::with_probe(
            Target::Host("bad host".to_string()),
            Arc::new(MockProbe::always(ReachabilityFlags::empty())),
        );

        assert!(matches!(
            result,
            Err(ReachabilityError::FailedToCreateWithHostname { hostname }) if hostname == "bad host"
        ));
    }

    #[test]
    fn hostname_with_nul_is_rejected() {
        let result = Reachability::with_probe(
            Target::Host("bad\0host".to_string()),
            Arc::new(MockProbe::always(ReachabilityFlags::empty())),
        );

        assert!(result.is_err());
    }

    #[test]
    fn valid_hostname_is_accepted() {
        let result = Reachability::with_probe(
            Target::Host("example.com".to_string()),
            Arc::new(MockProbe::always(ReachabilityFlags::empty())),
        );

        assert!(result.is_ok());
    }

    #[test]
    fn failing_platform_is_rejected_at_creation() {
        let result = Reachability::with_probe(
            Target::DefaultRoute,
            Arc::new(MockProbe::new(vec![Err(ProbeError::Platform {
                message: "no routing socket".to_string(),
            })])),
        );

        assert!(matches!(result, Err(ReachabilityError::CreateFailed { .. })));
    }

    #[test]
    fn new_handle_has_no_notifier() {
        let reachability = handle_with(Arc::new(MockProbe::always(ReachabilityFlags::REACHABLE)));

        assert!(!reachability.is_notifier_running());
        assert!(reachability.allow_cellular());
        assert!(reachability.target().is_default_route());
    }
}

mod accessors {
    use super::*;

    #[test]
    fn reachable_flags_report_wifi() {
        let reachability =
            handle_with(Arc::new(MockProbe::always(ReachabilityFlags::REACHABLE)));

        assert_eq!(reachability.flags(), ReachabilityFlags::REACHABLE);
        assert_eq!(reachability.status(), NetworkStatus::ReachableViaWifi);
        assert!(reachability.is_reachable());
        assert!(reachability.is_reachable_via_wifi());
        assert!(!reachability.is_reachable_via_cellular());
    }

    #[test]
    fn cellular_flags_report_cellular() {
        let flags = ReachabilityFlags::REACHABLE | ReachabilityFlags::IS_CELLULAR;
        let reachability = handle_with(Arc::new(MockProbe::always(flags)));

        assert_eq!(reachability.status(), NetworkStatus::ReachableViaCellular);
        assert!(reachability.is_reachable());
        assert!(reachability.is_reachable_via_cellular());
        assert!(!reachability.is_reachable_via_wifi());
    }

    #[test]
    fn cellular_gate_makes_cellular_unreachable() {
        let flags = ReachabilityFlags::REACHABLE | ReachabilityFlags::IS_CELLULAR;
        let reachability =
            handle_with(Arc::new(MockProbe::always(flags))).with_allow_cellular(false);

        // The gate affects usability, not the raw classification.
        assert!(!reachability.is_reachable());
        assert!(reachability.is_reachable_via_cellular());
        assert_eq!(reachability.status(), NetworkStatus::ReachableViaCellular);
    }

    #[test]
    fn connection_predicates_require_the_connection_required_bit() {
        let on_demand_only = handle_with(Arc::new(MockProbe::always(
            ReachabilityFlags::CONNECTION_ON_DEMAND,
        )));
        assert!(!on_demand_only.is_connection_on_demand());

        let required_on_demand = handle_with(Arc::new(MockProbe::always(
            ReachabilityFlags::CONNECTION_REQUIRED | ReachabilityFlags::CONNECTION_ON_DEMAND,
        )));
        assert!(required_on_demand.is_connection_required());
        assert!(required_on_demand.is_connection_on_demand());

        let required_intervention = handle_with(Arc::new(MockProbe::always(
            ReachabilityFlags::CONNECTION_REQUIRED | ReachabilityFlags::INTERVENTION_REQUIRED,
        )));
        assert!(required_intervention.is_intervention_required());
    }

    #[test]
    fn probe_failure_reads_as_empty_flags() {
        // First Ok satisfies the creation check; the accessor then hits
        // the error.
        let probe = MockProbe::new(vec![
            Ok(ReachabilityFlags::REACHABLE),
            Err(ProbeError::Platform {
                message: "transient error".to_string(),
            }),
        ]);
        let reachability = handle_with(Arc::new(probe));

        assert_eq!(reachability.flags(), ReachabilityFlags::empty());
        assert_eq!(reachability.status(), NetworkStatus::NotReachable);
    }

    #[test]
    fn display_renders_the_flag_string() {
        let reachability =
            handle_with(Arc::new(MockProbe::always(ReachabilityFlags::REACHABLE)));

        assert_eq!(reachability.to_string(), "-R -------");
    }
}

mod notifier {
    use super::*;

    fn fast_poll_only(probe: Arc<dyn FlagsProbe>) -> Reachability {
        handle_with(probe)
            .with_poll_only(true)
            .with_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn initial_state_is_broadcast() {
        let mut reachability =
            fast_poll_only(Arc::new(MockProbe::always(ReachabilityFlags::REACHABLE)));
        let mut rx = reachability.subscribe();

        reachability.start_notifier().unwrap();

        let change = rx.recv().await.unwrap();
        assert_eq!(change.status, NetworkStatus::ReachableViaWifi);
    }

    #[tokio::test(start_paused = true)]
    async fn transitions_are_broadcast_once_per_distinct_value() {
        let probe = MockProbe::returning_flags(vec![
            ReachabilityFlags::empty(),
            ReachabilityFlags::empty(),
            ReachabilityFlags::REACHABLE,
            ReachabilityFlags::REACHABLE,
        ]);
        let mut reachability = fast_poll_only(Arc::new(probe));
        let mut rx = reachability.subscribe();

        reachability.start_notifier().unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.status, NetworkStatus::NotReachable);
        assert_eq!(second.status, NetworkStatus::ReachableViaWifi);

        // The script has settled; no third event may arrive.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn callbacks_fire_on_transitions() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let probe = MockProbe::returning_flags(vec![
            ReachabilityFlags::empty(),
            ReachabilityFlags::REACHABLE,
        ]);

        let mut reachability = fast_poll_only(Arc::new(probe));
        let up = Arc::clone(&events);
        reachability.when_reachable(move |_| up.lock().unwrap().push("reachable"));
        let down = Arc::clone(&events);
        reachability.when_unreachable(move |_| down.lock().unwrap().push("unreachable"));

        let mut rx = reachability.subscribe();
        reachability.start_notifier().unwrap();

        // Callbacks run before the broadcast, so two received events
        // mean both callbacks have fired.
        let _ = rx.recv().await.unwrap();
        let _ = rx.recv().await.unwrap();

        assert_eq!(*events.lock().unwrap(), vec!["unreachable", "reachable"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cellular_gate_selects_the_unreachable_callback() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let flags = ReachabilityFlags::REACHABLE | ReachabilityFlags::IS_CELLULAR;

        let mut reachability = fast_poll_only(Arc::new(MockProbe::always(flags)))
            .with_allow_cellular(false);
        let up = Arc::clone(&events);
        reachability.when_reachable(move |_| up.lock().unwrap().push("reachable"));
        let down = Arc::clone(&events);
        reachability.when_unreachable(move |_| down.lock().unwrap().push("unreachable"));

        let mut rx = reachability.subscribe();
        reachability.start_notifier().unwrap();

        let _ = rx.recv().await.unwrap();

        assert_eq!(*events.lock().unwrap(), vec!["unreachable"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_events() {
        let probe = Arc::new(SwitchProbe::new(ReachabilityFlags::REACHABLE));
        let mut reachability = fast_poll_only(Arc::clone(&probe) as Arc<dyn FlagsProbe>);
        let mut rx = reachability.subscribe();

        reachability.start_notifier().unwrap();
        let _ = rx.recv().await.unwrap();

        reachability.stop_notifier();
        assert!(!reachability.is_notifier_running());

        // A change after stopping must never be delivered.
        probe.set(ReachabilityFlags::empty());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn starting_twice_is_a_noop() {
        let mut reachability =
            fast_poll_only(Arc::new(MockProbe::always(ReachabilityFlags::REACHABLE)));

        reachability.start_notifier().unwrap();
        reachability.start_notifier().unwrap();

        assert!(reachability.is_notifier_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_an_idle_handle_is_a_noop() {
        let mut reachability =
            fast_poll_only(Arc::new(MockProbe::always(ReachabilityFlags::REACHABLE)));

        reachability.stop_notifier();
        reachability.stop_notifier();

        assert!(!reachability.is_notifier_running());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_notifier() {
        let probe = Arc::new(SwitchProbe::new(ReachabilityFlags::REACHABLE));
        let rx = {
            let mut reachability = fast_poll_only(Arc::clone(&probe) as Arc<dyn FlagsProbe>);
            let mut rx = reachability.subscribe();
            reachability.start_notifier().unwrap();
            let _ = rx.recv().await.unwrap();
            rx
        };

        // The handle is gone; a flag change must not produce an event.
        probe.set(ReachabilityFlags::empty());
        tokio::time::sleep(Duration::from_millis(200)).await;

        let mut rx = rx;
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Closed)
        ));
    }
}

mod platform_integration {
    use super::*;

    #[test]
    fn loopback_address_is_reachable() {
        let reachability = Reachability::with_address("127.0.0.1".parse().unwrap()).unwrap();

        assert!(reachability.is_reachable());
        assert!(reachability.flags().is_local_address());
    }

    #[test]
    fn resolvable_host_reports_reachable() {
        let reachability = Reachability::host("localhost").unwrap();

        assert!(reachability.is_reachable());
    }

    #[test]
    fn unresolvable_host_is_never_reachable() {
        // Reserved TLD, guaranteed not to resolve (RFC 2606).
        let reachability = Reachability::host("host.invalid").unwrap();

        assert!(!reachability.is_reachable());
        assert_eq!(reachability.status(), NetworkStatus::NotReachable);
    }

    #[test]
    fn default_route_handle_can_be_created() {
        assert!(Reachability::internet().is_ok());
    }
}
