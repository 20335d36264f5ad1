//! Windows flag probe backed by the IP Helper routing API.
//!
//! `GetBestRoute2` answers "which route would carry traffic to this
//! destination" from the kernel forwarding table, and `GetIfEntry2`
//! classifies the egress interface. No packets are sent.

use std::net::IpAddr;

use windows::Win32::Foundation::{
    ERROR_HOST_UNREACHABLE, ERROR_NETWORK_UNREACHABLE, NO_ERROR, WIN32_ERROR,
};
use windows::Win32::NetworkManagement::IpHelper::{
    GetBestRoute2, GetIfEntry2, MIB_IF_ROW2, MIB_IPFORWARD_ROW2,
};
use windows::Win32::NetworkManagement::Ndis::{
    IF_TYPE_IEEE80211, IF_TYPE_SOFTWARE_LOOPBACK, IF_TYPE_WWANPP, IF_TYPE_WWANPP2,
};
use windows::Win32::Networking::WinSock::{
    AF_INET, AF_INET6, IN6_ADDR, IN_ADDR, SOCKADDR_IN, SOCKADDR_IN6, SOCKADDR_INET,
};

use crate::flags::ReachabilityFlags;
use crate::probe::{FlagsProbe, LinkKind, ProbeError, Target};

use super::resolve_host;

/// Windows implementation of [`FlagsProbe`] using `GetBestRoute2`.
///
/// A found route sets `REACHABLE`; a zero next hop sets `IS_DIRECT`; a
/// loopback egress sets `IS_LOCAL_ADDRESS`; a WWAN egress sets
/// `IS_CELLULAR`. Unreachable destinations and unresolvable hostnames
/// yield empty flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct IpHelperProbe {
    _private: (),
}

impl IpHelperProbe {
    /// Creates a new IP Helper probe.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl FlagsProbe for IpHelperProbe {
    fn probe(&self, target: &Target) -> Result<ReachabilityFlags, ProbeError> {
        let addr = match target {
            Target::Address(addr) => *addr,
            Target::Host(name) => match resolve_host(name) {
                Some(addr) => addr,
                // Unresolvable host reads as not-reachable.
                None => return Ok(ReachabilityFlags::empty()),
            },
            // The unspecified address asks for the default route.
            Target::DefaultRoute => IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
        };

        best_route_flags(addr)
    }
}

/// Looks up the best route to an address and maps it to flags.
///
/// Excluded from coverage - requires the live Windows routing table.
#[cfg(not(tarpaulin_include))]
fn best_route_flags(addr: IpAddr) -> Result<ReachabilityFlags, ProbeError> {
    let destination = sockaddr_inet(addr);
    let mut route = MIB_IPFORWARD_ROW2::default();
    let mut source = SOCKADDR_INET::default();

    // SAFETY: destination, route and source are valid for the call.
    let result = unsafe { GetBestRoute2(None, 0, None, &destination, 0, &mut route, &mut source) };

    if result == ERROR_NETWORK_UNREACHABLE || result == ERROR_HOST_UNREACHABLE {
        return Ok(ReachabilityFlags::empty());
    }
    if result != NO_ERROR {
        return Err(windows::core::Error::from(WIN32_ERROR(result.0)).into());
    }

    let mut flags = ReachabilityFlags::REACHABLE;
    if next_hop_is_zero(&route) {
        flags |= ReachabilityFlags::IS_DIRECT;
    }
    match interface_kind(route.InterfaceIndex) {
        LinkKind::Cellular => flags |= ReachabilityFlags::IS_CELLULAR,
        LinkKind::Loopback => flags |= ReachabilityFlags::IS_LOCAL_ADDRESS,
        LinkKind::Wired | LinkKind::Wireless | LinkKind::Other => {}
    }

    Ok(flags)
}

/// Returns true if the route's next hop is the unspecified address.
fn next_hop_is_zero(route: &MIB_IPFORWARD_ROW2) -> bool {
    // SAFETY: reading the union member selected by si_family.
    unsafe {
        match route.NextHop.si_family {
            AF_INET => route.NextHop.Ipv4.sin_addr.S_un.S_addr == 0,
            AF_INET6 => route.NextHop.Ipv6.sin6_addr.u.Byte == [0u8; 16],
            _ => false,
        }
    }
}

/// Classifies the interface with the given index.
///
/// Excluded from coverage - requires live Windows interface state.
#[cfg(not(tarpaulin_include))]
fn interface_kind(index: u32) -> LinkKind {
    let mut row = MIB_IF_ROW2 {
        InterfaceIndex: index,
        ..Default::default()
    };

    // SAFETY: row is valid and keyed by InterfaceIndex.
    if unsafe { GetIfEntry2(&mut row) } != NO_ERROR {
        return LinkKind::Other;
    }

    match row.Type {
        t if t == IF_TYPE_SOFTWARE_LOOPBACK => LinkKind::Loopback,
        t if t == IF_TYPE_IEEE80211 => LinkKind::Wireless,
        t if t == IF_TYPE_WWANPP || t == IF_TYPE_WWANPP2 => LinkKind::Cellular,
        _ => LinkKind::Wired,
    }
}

/// Builds a `SOCKADDR_INET` for an address.
fn sockaddr_inet(addr: IpAddr) -> SOCKADDR_INET {
    let mut inet = SOCKADDR_INET::default();
    match addr {
        IpAddr::V4(v4) => {
            let mut sin = SOCKADDR_IN::default();
            sin.sin_family = AF_INET;
            sin.sin_addr = IN_ADDR::default();
            // SAFETY: writing the union member matching AF_INET.
            unsafe {
                sin.sin_addr.S_un.S_addr = u32::from_ne_bytes(v4.octets());
            }
            inet.Ipv4 = sin;
        }
        IpAddr::V6(v6) => {
            let mut sin6 = SOCKADDR_IN6::default();
            sin6.sin6_family = AF_INET6;
            let mut in6 = IN6_ADDR::default();
            // SAFETY: writing the union member matching AF_INET6.
            unsafe {
                in6.u.Byte = v6.octets();
            }
            sin6.sin6_addr = in6;
            inet.Ipv6 = sin6;
        }
    }
    inet
}
