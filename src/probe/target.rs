//! Reachability targets.

use std::fmt;
use std::net::IpAddr;

/// What a reachability handle is bound to.
///
/// # Equality
///
/// Targets compare structurally; hostnames are case-sensitive as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The default route ("can this host reach the internet at all").
    ///
    /// The platform counterpart of querying the zero address.
    DefaultRoute,
    /// A concrete IP address.
    Address(IpAddr),
    /// A hostname, resolved through the system resolver at probe time.
    Host(String),
}

impl Target {
    /// Returns the hostname if this target is a host.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        match self {
            Self::Host(name) => Some(name),
            Self::DefaultRoute | Self::Address(_) => None,
        }
    }

    /// Returns the address if this target is a concrete address.
    #[must_use]
    pub const fn address(&self) -> Option<IpAddr> {
        match self {
            Self::Address(addr) => Some(*addr),
            Self::DefaultRoute | Self::Host(_) => None,
        }
    }

    /// Returns true for the default-route sentinel.
    #[must_use]
    pub const fn is_default_route(&self) -> bool {
        matches!(self, Self::DefaultRoute)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultRoute => write!(f, "default route"),
            Self::Address(addr) => write!(f, "{addr}"),
            Self::Host(name) => write!(f, "{name}"),
        }
    }
}
