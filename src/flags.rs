//! Reachability flags and status decoding.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Attributes of the current network path to a target, as reported by
    /// the platform reachability facility.
    ///
    /// Bit values follow the native Apple flag layout so the macOS backend
    /// maps the OS word directly. Backends that cannot observe a given
    /// attribute leave its bit clear.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ReachabilityFlags: u32 {
        /// The path is transient (e.g. a PPP link).
        const TRANSIENT_CONNECTION = 1 << 0;
        /// A network path to the target exists.
        const REACHABLE = 1 << 1;
        /// A connection must be established before traffic can flow.
        const CONNECTION_REQUIRED = 1 << 2;
        /// The connection is established on outbound traffic.
        const CONNECTION_ON_TRAFFIC = 1 << 3;
        /// User intervention (e.g. entering credentials) is required.
        const INTERVENTION_REQUIRED = 1 << 4;
        /// The connection is established on demand.
        const CONNECTION_ON_DEMAND = 1 << 5;
        /// The target is an address on the local host.
        const IS_LOCAL_ADDRESS = 1 << 16;
        /// The target is reached directly, without an intermediate gateway.
        const IS_DIRECT = 1 << 17;
        /// The path goes over a cellular (WWAN) link.
        const IS_CELLULAR = 1 << 18;
    }
}

impl ReachabilityFlags {
    /// Returns true if a network path to the target exists.
    #[must_use]
    pub const fn is_reachable(self) -> bool {
        self.contains(Self::REACHABLE)
    }

    /// Returns true if a connection must be established first.
    #[must_use]
    pub const fn is_connection_required(self) -> bool {
        self.contains(Self::CONNECTION_REQUIRED)
    }

    /// Returns true if the path is transient.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.contains(Self::TRANSIENT_CONNECTION)
    }

    /// Returns true if user intervention is required to connect.
    #[must_use]
    pub const fn is_intervention_required(self) -> bool {
        self.contains(Self::INTERVENTION_REQUIRED)
    }

    /// Returns true if a connection is established on outbound traffic.
    #[must_use]
    pub const fn is_connection_on_traffic(self) -> bool {
        self.contains(Self::CONNECTION_ON_TRAFFIC)
    }

    /// Returns true if a connection is established on demand.
    #[must_use]
    pub const fn is_connection_on_demand(self) -> bool {
        self.contains(Self::CONNECTION_ON_DEMAND)
    }

    /// Returns true if the target is an address on the local host.
    #[must_use]
    pub const fn is_local_address(self) -> bool {
        self.contains(Self::IS_LOCAL_ADDRESS)
    }

    /// Returns true if the target is reached without a gateway.
    #[must_use]
    pub const fn is_direct(self) -> bool {
        self.contains(Self::IS_DIRECT)
    }

    /// Returns true if the path goes over a cellular link.
    #[must_use]
    pub const fn is_cellular(self) -> bool {
        self.contains(Self::IS_CELLULAR)
    }

    /// Returns true if a connection would be established on traffic or
    /// on demand.
    #[must_use]
    pub const fn is_connection_on_traffic_or_demand(self) -> bool {
        self.intersects(Self::CONNECTION_ON_TRAFFIC.union(Self::CONNECTION_ON_DEMAND))
    }

    /// Returns true if the path both requires a connection and is
    /// transient. Such a path is treated as unusable.
    #[must_use]
    pub const fn is_connection_required_and_transient(self) -> bool {
        let test = Self::CONNECTION_REQUIRED.union(Self::TRANSIENT_CONNECTION);
        self.intersection(test).bits() == test.bits()
    }

    /// Returns true if these flags describe a path that is usable right
    /// now.
    ///
    /// A path is usable when it is reachable, is not simultaneously
    /// connection-required and transient, and is not cellular-only when
    /// `allow_cellular` is false.
    #[must_use]
    pub const fn can_connect(self, allow_cellular: bool) -> bool {
        if !self.is_reachable() {
            return false;
        }
        if self.is_connection_required_and_transient() {
            return false;
        }
        if self.is_cellular() && !allow_cellular {
            return false;
        }
        true
    }
}

impl fmt::Display for ReachabilityFlags {
    /// Renders the compact flag string, one position per attribute:
    /// `W R  c t i C D l d` with `-` for a clear bit.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {}{}{}{}{}{}{}",
            if self.is_cellular() { 'W' } else { '-' },
            if self.is_reachable() { 'R' } else { '-' },
            if self.is_connection_required() { 'c' } else { '-' },
            if self.is_transient() { 't' } else { '-' },
            if self.is_intervention_required() { 'i' } else { '-' },
            if self.is_connection_on_traffic() { 'C' } else { '-' },
            if self.is_connection_on_demand() { 'D' } else { '-' },
            if self.is_local_address() { 'l' } else { '-' },
            if self.is_direct() { 'd' } else { '-' },
        )
    }
}

/// Decoded reachability status of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkStatus {
    /// No usable network path to the target.
    NotReachable,
    /// The target is reachable over Wi-Fi (or another non-cellular link).
    ReachableViaWifi,
    /// The target is reachable over a cellular link.
    ReachableViaCellular,
}

impl NetworkStatus {
    /// Decodes the status from a flag word.
    ///
    /// This is a pure function: equal flags always decode to the same
    /// status, and nothing else is consulted.
    #[must_use]
    pub const fn from_flags(flags: ReachabilityFlags) -> Self {
        if !flags.is_reachable() || flags.is_connection_required_and_transient() {
            return Self::NotReachable;
        }
        if flags.is_cellular() {
            return Self::ReachableViaCellular;
        }
        Self::ReachableViaWifi
    }

    /// Returns true if the target is reachable at all.
    #[must_use]
    pub const fn is_reachable(self) -> bool {
        !matches!(self, Self::NotReachable)
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReachable => write!(f, "No Connection"),
            Self::ReachableViaWifi => write!(f, "WiFi"),
            Self::ReachableViaCellular => write!(f, "Cellular"),
        }
    }
}
