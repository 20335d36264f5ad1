//! Platform-specific change listener implementations.
//!
//! This module provides conditional compilation for platform-specific
//! implementations of the [`ChangeListener`](super::ChangeListener)
//! trait.
//!
//! # Platform Support
//!
//! - **Linux**: a netlink route socket subscribed to link/address/route
//!   multicast groups.
//! - **macOS**: the `SCNetworkReachability` callback scheduled on a
//!   private dispatch queue.
//! - **Windows**: `NotifyIpInterfaceChange` from the IP Helper API.
//!
//! Each listener signals "network state may have changed"; the consumer
//! re-probes the target to learn the new flags. On Linux and Windows the
//! native facility is system-wide, so the target is ignored; on macOS
//! the registration is per-target.

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::{NetlinkChangeListener, NetlinkEventStream};

// Re-export the platform listener under a common name for convenience
#[cfg(target_os = "linux")]
pub use linux::NetlinkChangeListener as PlatformListener;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::{ReachabilityCallbackListener, ReachabilityEventStream};

#[cfg(target_os = "macos")]
pub use macos::ReachabilityCallbackListener as PlatformListener;

#[cfg(windows)]
mod windows;

#[cfg(windows)]
pub use windows::{IpInterfaceListener, IpInterfaceStream};

#[cfg(windows)]
pub use windows::IpInterfaceListener as PlatformListener;
