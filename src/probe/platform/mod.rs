//! Platform-specific flag probe implementations.
//!
//! This module provides conditional compilation for platform-specific
//! implementations of the [`FlagsProbe`](super::FlagsProbe) trait.
//!
//! # Platform Support
//!
//! - **Linux**: netlink `RTM_GETROUTE` queries against the kernel
//!   routing tables.
//! - **macOS**: `SCNetworkReachability` from the SystemConfiguration
//!   framework.
//! - **Windows**: `GetBestRoute2` / `GetIfEntry2` via the `windows`
//!   crate.

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::NetlinkRouteProbe;

// Re-export the platform probe under a common name for convenience
#[cfg(target_os = "linux")]
pub use linux::NetlinkRouteProbe as PlatformProbe;

// pub(crate): the macOS listener shares the SCNetworkReachability handle.
#[cfg(target_os = "macos")]
pub(crate) mod macos;

#[cfg(target_os = "macos")]
pub use macos::SystemConfigurationProbe;

#[cfg(target_os = "macos")]
pub use macos::SystemConfigurationProbe as PlatformProbe;

#[cfg(windows)]
mod windows;

#[cfg(windows)]
pub use windows::IpHelperProbe;

#[cfg(windows)]
pub use windows::IpHelperProbe as PlatformProbe;

#[cfg(any(target_os = "linux", windows))]
use std::net::{IpAddr, ToSocketAddrs};

/// Resolves a hostname through the system resolver, preferring IPv4.
///
/// Returns `None` when the name does not resolve; an unresolvable host
/// reads as not-reachable, never as an error.
#[cfg(any(target_os = "linux", windows))]
pub(crate) fn resolve_host(host: &str) -> Option<IpAddr> {
    let addrs: Vec<IpAddr> = (host, 0)
        .to_socket_addrs()
        .ok()?
        .map(|sock| sock.ip())
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}
