//! The reachability handle.
//!
//! [`Reachability`] binds a target (hostname, address, or the default
//! route), answers flag and status queries on demand, and runs an
//! optional notifier that invokes callbacks and broadcasts events when
//! the decoded state changes.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};

use crate::flags::{NetworkStatus, ReachabilityFlags};
use crate::monitor::platform::PlatformListener;
use crate::monitor::{HybridMonitor, ListenError, PollingMonitor, StatusChange};
use crate::probe::platform::PlatformProbe;
use crate::probe::{FlagsProbe, ProbeError, Target};

/// A consumer-supplied status callback.
pub type StatusCallback = Arc<dyn Fn(&StatusChange) + Send + Sync>;

/// Broadcast channel capacity for status change events.
const EVENT_CAPACITY: usize = 32;

/// Default safety-net polling interval for the notifier.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Error type for reachability handle operations.
///
/// All failures are surfaced synchronously at setup time; nothing is
/// retried.
#[derive(Debug, Error)]
pub enum ReachabilityError {
    /// The hostname failed validation at handle creation.
    #[error("Failed to create reachability handle for hostname '{hostname}'")]
    FailedToCreateWithHostname {
        /// The rejected hostname.
        hostname: String,
    },

    /// The platform could not answer for the target at handle creation.
    #[error("Failed to create reachability handle for {target}")]
    CreateFailed {
        /// The rejected target.
        target: Target,
        /// The underlying platform error.
        #[source]
        source: ProbeError,
    },

    /// The native change notification could not be registered.
    #[error("Failed to start reachability notifier")]
    Notifier(#[source] ListenError),
}

/// Paired reachable/unreachable callbacks, cloned into the notifier
/// task.
#[derive(Clone, Default)]
struct CallbackSet {
    reachable: Option<StatusCallback>,
    unreachable: Option<StatusCallback>,
}

/// Handle onto the running notifier task.
struct NotifierHandle {
    task: JoinHandle<()>,
}

/// A network reachability handle.
///
/// Construct one for a hostname, a concrete address, or the default
/// route; query it with the flag accessors; and optionally start the
/// notifier to be called back on changes.
///
/// # Example
///
/// ```no_run
/// use reachability::Reachability;
///
/// # async fn example() -> Result<(), reachability::ReachabilityError> {
/// let mut reachability = Reachability::host("example.com")?;
/// reachability.when_reachable(|change| println!("up: {}", change.status));
/// reachability.when_unreachable(|_| println!("down"));
/// reachability.start_notifier()?;
/// # Ok(())
/// # }
/// ```
///
/// # Runtime
///
/// `start_notifier` spawns a Tokio task and must be called within a
/// Tokio runtime. Callbacks and broadcast sends run on that task.
pub struct Reachability {
    target: Target,
    probe: Arc<dyn FlagsProbe>,
    allow_cellular: bool,
    poll_interval: Duration,
    poll_only: bool,
    callbacks: CallbackSet,
    sender: broadcast::Sender<StatusChange>,
    notifier: Option<NotifierHandle>,
}

impl Reachability {
    /// Creates a handle watching a hostname.
    ///
    /// The name is validated here; resolution happens through the
    /// system resolver on every probe, so an unresolvable host reads as
    /// not-reachable rather than failing construction.
    ///
    /// # Errors
    ///
    /// Returns [`ReachabilityError::FailedToCreateWithHostname`] for an
    /// empty name or one containing whitespace or NUL.
    pub fn host(hostname: impl Into<String>) -> Result<Self, ReachabilityError> {
        Self::with_probe(
            Target::Host(hostname.into()),
            Arc::new(PlatformProbe::default()),
        )
    }

    /// Creates a handle watching a concrete IP address.
    ///
    /// # Errors
    ///
    /// Returns [`ReachabilityError::CreateFailed`] when the platform
    /// cannot answer route queries for the address.
    pub fn with_address(address: IpAddr) -> Result<Self, ReachabilityError> {
        Self::with_probe(Target::Address(address), Arc::new(PlatformProbe::default()))
    }

    /// Creates a handle watching the default route ("is the internet
    /// reachable at all").
    ///
    /// # Errors
    ///
    /// Returns [`ReachabilityError::CreateFailed`] when the platform
    /// cannot answer route queries.
    pub fn internet() -> Result<Self, ReachabilityError> {
        Self::with_probe(Target::DefaultRoute, Arc::new(PlatformProbe::default()))
    }

    /// Creates a handle with a caller-supplied probe.
    ///
    /// This is the seam used by tests and by consumers that fake the
    /// platform.
    ///
    /// # Errors
    ///
    /// Hostname targets are validated; every target is probed once so a
    /// platform that cannot answer fails here, synchronously, rather
    /// than at runtime.
    pub fn with_probe(
        target: Target,
        probe: Arc<dyn FlagsProbe>,
    ) -> Result<Self, ReachabilityError> {
        if let Target::Host(hostname) = &target {
            if !is_valid_hostname(hostname) {
                return Err(ReachabilityError::FailedToCreateWithHostname {
                    hostname: hostname.clone(),
                });
            }
        }

        probe
            .probe(&target)
            .map_err(|source| ReachabilityError::CreateFailed {
                target: target.clone(),
                source,
            })?;

        let (sender, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            target,
            probe,
            allow_cellular: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_only: false,
            callbacks: CallbackSet::default(),
            sender,
            notifier: None,
        })
    }

    /// Sets the notifier's safety-net polling interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Disables the platform listener; the notifier will poll only.
    #[must_use]
    pub fn with_poll_only(mut self, poll_only: bool) -> Self {
        self.poll_only = poll_only;
        self
    }

    /// Sets whether a cellular-only path counts as reachable.
    ///
    /// Defaults to true. When false, [`is_reachable`](Self::is_reachable)
    /// reports false on cellular and the unreachable callback fires for
    /// cellular transitions.
    #[must_use]
    pub fn with_allow_cellular(mut self, allow: bool) -> Self {
        self.allow_cellular = allow;
        self
    }

    /// Registers the callback invoked when the target becomes usable.
    pub fn when_reachable<F>(&mut self, callback: F)
    where
        F: Fn(&StatusChange) + Send + Sync + 'static,
    {
        self.callbacks.reachable = Some(Arc::new(callback));
    }

    /// Registers the callback invoked when the target stops being
    /// usable.
    pub fn when_unreachable<F>(&mut self, callback: F)
    where
        F: Fn(&StatusChange) + Send + Sync + 'static,
    {
        self.callbacks.unreachable = Some(Arc::new(callback));
    }

    /// Returns the watched target.
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Returns whether cellular-only paths count as reachable.
    #[must_use]
    pub const fn allow_cellular(&self) -> bool {
        self.allow_cellular
    }

    /// Reads the current flags from the platform.
    ///
    /// A failed platform query reads as empty flags, matching the
    /// accessor-never-fails contract of the underlying facility.
    #[must_use]
    pub fn flags(&self) -> ReachabilityFlags {
        self.probe.probe(&self.target).unwrap_or_default()
    }

    /// Decodes the current status.
    #[must_use]
    pub fn status(&self) -> NetworkStatus {
        NetworkStatus::from_flags(self.flags())
    }

    /// Returns true if the target is usable right now, honoring the
    /// cellular gate.
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.flags().can_connect(self.allow_cellular)
    }

    /// Returns true if the target is reachable over a non-cellular
    /// link.
    #[must_use]
    pub fn is_reachable_via_wifi(&self) -> bool {
        self.status() == NetworkStatus::ReachableViaWifi
    }

    /// Returns true if the target is reachable over a cellular link,
    /// regardless of the cellular gate.
    #[must_use]
    pub fn is_reachable_via_cellular(&self) -> bool {
        let flags = self.flags();
        flags.is_reachable() && flags.is_cellular()
    }

    /// Returns true if a connection must be established before traffic
    /// can flow.
    #[must_use]
    pub fn is_connection_required(&self) -> bool {
        self.flags().is_connection_required()
    }

    /// Returns true if the required connection would be established on
    /// demand or on traffic.
    #[must_use]
    pub fn is_connection_on_demand(&self) -> bool {
        let flags = self.flags();
        flags.is_connection_required() && flags.is_connection_on_traffic_or_demand()
    }

    /// Returns true if user intervention is required to establish the
    /// connection.
    #[must_use]
    pub fn is_intervention_required(&self) -> bool {
        let flags = self.flags();
        flags.is_connection_required() && flags.is_intervention_required()
    }

    /// Subscribes to status change events.
    ///
    /// Events are broadcast to every subscriber whenever the notifier
    /// observes a distinct flag value. Subscribing before
    /// [`start_notifier`](Self::start_notifier) guarantees the initial
    /// event is received.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.sender.subscribe()
    }

    /// Returns true while the notifier task is running.
    #[must_use]
    pub const fn is_notifier_running(&self) -> bool {
        self.notifier.is_some()
    }

    /// Starts the notifier.
    ///
    /// In the default hybrid mode the platform listener is registered
    /// here; with [`with_poll_only`](Self::with_poll_only) the notifier
    /// polls at the configured interval instead. Either way the first
    /// observation always fires, and afterwards callbacks fire at most
    /// once per distinct flag value.
    ///
    /// Starting an already-running notifier is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ReachabilityError::Notifier`] when the platform
    /// listener cannot be registered.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start_notifier(&mut self) -> Result<(), ReachabilityError> {
        if self.notifier.is_some() {
            return Ok(());
        }

        let probe = Arc::clone(&self.probe);
        let target = self.target.clone();
        let sender = self.sender.clone();
        let callbacks = self.callbacks.clone();
        let allow_cellular = self.allow_cellular;

        let task = if self.poll_only {
            let stream =
                PollingMonitor::new(probe, target, self.poll_interval).into_stream();
            tokio::spawn(dispatch_loop(stream, sender, callbacks, allow_cellular))
        } else {
            let listener =
                PlatformListener::new(&self.target).map_err(ReachabilityError::Notifier)?;
            let stream =
                HybridMonitor::new(probe, target, listener, self.poll_interval).into_stream();
            tokio::spawn(dispatch_loop(stream, sender, callbacks, allow_cellular))
        };

        self.notifier = Some(NotifierHandle { task });
        Ok(())
    }

    /// Stops the notifier.
    ///
    /// The monitor task is cancelled and its stream dropped, which
    /// unregisters the native subscription. Stopping an idle handle is
    /// a no-op.
    pub fn stop_notifier(&mut self) {
        if let Some(handle) = self.notifier.take() {
            handle.task.abort();
        }
    }
}

impl Drop for Reachability {
    fn drop(&mut self) {
        self.stop_notifier();
    }
}

impl fmt::Display for Reachability {
    /// Renders the current flags in the compact flag-string form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.flags())
    }
}

impl fmt::Debug for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reachability")
            .field("target", &self.target)
            .field("allow_cellular", &self.allow_cellular)
            .field("poll_interval", &self.poll_interval)
            .field("poll_only", &self.poll_only)
            .field("notifier_running", &self.notifier.is_some())
            .finish_non_exhaustive()
    }
}

/// Consumes status changes, invoking callbacks and broadcasting.
async fn dispatch_loop<S>(
    mut stream: S,
    sender: broadcast::Sender<StatusChange>,
    callbacks: CallbackSet,
    allow_cellular: bool,
) where
    S: Stream<Item = StatusChange> + Unpin,
{
    while let Some(change) = stream.next().await {
        tracing::debug!("Reachability changed: {} [{}]", change.status, change.flags);

        let callback = if change.flags.can_connect(allow_cellular) {
            &callbacks.reachable
        } else {
            &callbacks.unreachable
        };
        if let Some(callback) = callback {
            callback(&change);
        }

        // No receivers is fine; subscribers come and go.
        let _ = sender.send(change);
    }
}

/// Validates a hostname for handle creation.
///
/// Resolution is not attempted here; only names that can never be
/// handed to the resolver are rejected.
fn is_valid_hostname(hostname: &str) -> bool {
    !hostname.is_empty()
        && !hostname.contains('\0')
        && !hostname.contains(char::is_whitespace)
}

#[cfg(test)]
#[path = "reachability_tests.rs"]
mod tests;
