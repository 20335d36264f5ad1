//! Change listener trait for platform event notifications.
//!
//! This module provides the [`ChangeListener`] trait that abstracts the
//! platform-specific facilities which signal "network state may have
//! changed".

use super::ListenError;
use tokio_stream::Stream;

/// Trait for platform-specific network change notification facilities.
///
/// Implementations wrap platform APIs like the Linux netlink route
/// socket or Windows `NotifyIpInterfaceChange` and expose them as async
/// streams of wake-up events. An event does not carry flags; it tells
/// the consumer to re-probe the target.
///
/// # One-time Semantics
///
/// `into_stream` consumes `self`, enforcing one-time use. If the
/// underlying facility fails, callers should fall back to polling
/// rather than attempting to recreate the listener.
///
/// # Stream Items
///
/// The stream yields `Result<(), ListenError>`:
/// - `Ok(())` - the network state may have changed; re-probe now
/// - `Err(ListenError)` - the listener failed; degrade to polling-only
pub trait ChangeListener: Send {
    /// The stream type returned by `into_stream`.
    type Stream: Stream<Item = Result<(), ListenError>> + Send + Unpin;

    /// Converts this listener into a notification stream.
    ///
    /// Consumes `self` to enforce one-time semantics.
    /// See trait-level documentation for error handling semantics.
    fn into_stream(self) -> Self::Stream;
}
