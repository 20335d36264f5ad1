//! Reachability: network connectivity monitoring.
//!
//! A thin wrapper around the host platform's network-reachability
//! facilities: query whether a hostname, address, or the default route
//! is currently usable (none / Wi-Fi / cellular), and subscribe to
//! change notifications.

pub mod config;
pub mod flags;
pub mod monitor;
pub mod probe;
pub mod time;

mod reachability;

pub use flags::{NetworkStatus, ReachabilityFlags};
pub use monitor::StatusChange;
pub use probe::Target;
pub use reachability::{Reachability, ReachabilityError, StatusCallback};
