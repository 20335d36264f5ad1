//! Linux flag probe backed by netlink `RTM_GETROUTE` queries.
//!
//! Reachability is derived from kernel routing state only: a concrete
//! address is looked up with a unicast route query, and the default-route
//! sentinel is answered by scanning the main routing table for a default
//! entry. No packets are sent toward the target.

use std::fs;
use std::net::IpAddr;
use std::path::Path;

use crate::flags::ReachabilityFlags;
use crate::probe::{FlagsProbe, LinkKind, ProbeError, Target};

use super::resolve_host;

/// Linux implementation of [`FlagsProbe`] using netlink route queries.
///
/// Each probe opens a short-lived `NETLINK_ROUTE` socket, issues an
/// `RTM_GETROUTE` request, and maps the reply onto [`ReachabilityFlags`]:
///
/// - a resolvable route sets `REACHABLE`
/// - a route without a gateway sets `IS_DIRECT`
/// - a local route (or loopback egress) sets `IS_LOCAL_ADDRESS`
/// - a cellular egress link sets `IS_CELLULAR`
///
/// `ENETUNREACH`/`EHOSTUNREACH` replies and unresolvable hostnames yield
/// empty flags rather than errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetlinkRouteProbe {
    _private: (),
}

impl NetlinkRouteProbe {
    /// Creates a new netlink route probe.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl FlagsProbe for NetlinkRouteProbe {
    fn probe(&self, target: &Target) -> Result<ReachabilityFlags, ProbeError> {
        match target {
            Target::Address(addr) => route_lookup(*addr),
            Target::Host(name) => match resolve_host(name) {
                Some(addr) => route_lookup(addr),
                // Unresolvable host reads as not-reachable.
                None => Ok(ReachabilityFlags::empty()),
            },
            Target::DefaultRoute => default_route_lookup(),
        }
    }
}

/// A parsed `RTM_NEWROUTE` reply.
#[derive(Debug, Clone, Copy)]
struct RouteReply {
    route_type: u8,
    dst_len: u8,
    table: u8,
    oif: Option<u32>,
    has_gateway: bool,
}

/// Terminal outcome of a netlink reply buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    Done,
    Error(i32),
}

/// Looks up the route to a concrete address and maps it to flags.
///
/// Excluded from coverage - requires a live kernel netlink socket.
#[cfg(not(tarpaulin_include))]
fn route_lookup(addr: IpAddr) -> Result<ReachabilityFlags, ProbeError> {
    let socket = NetlinkSocket::open()?;
    socket.send(&build_route_request(addr))?;

    let mut buf = vec![0u8; RECV_BUF_LEN];
    let len = socket.recv(&mut buf)?;

    let mut routes = Vec::new();
    match parse_reply(&buf[..len], &mut routes) {
        Some(Terminal::Error(code))
            if code == -libc::ENETUNREACH || code == -libc::EHOSTUNREACH =>
        {
            return Ok(ReachabilityFlags::empty());
        }
        Some(Terminal::Error(code)) => {
            return Err(ProbeError::Platform {
                message: format!("netlink route lookup failed with code {code}"),
            });
        }
        Some(Terminal::Done) | None => {}
    }

    Ok(routes
        .first()
        .map_or_else(ReachabilityFlags::empty, flags_for_route))
}

/// Scans the main routing table for a default route and maps it to flags.
///
/// Excluded from coverage - requires a live kernel netlink socket.
#[cfg(not(tarpaulin_include))]
fn default_route_lookup() -> Result<ReachabilityFlags, ProbeError> {
    let socket = NetlinkSocket::open()?;
    socket.send(&build_route_dump_request())?;

    let mut routes = Vec::new();
    let mut buf = vec![0u8; RECV_BUF_LEN];
    loop {
        let len = socket.recv(&mut buf)?;
        match parse_reply(&buf[..len], &mut routes) {
            Some(Terminal::Done) => break,
            Some(Terminal::Error(code)) => {
                return Err(ProbeError::Platform {
                    message: format!("netlink route dump failed with code {code}"),
                });
            }
            None => {}
        }
    }

    Ok(routes
        .iter()
        .find(|route| route.dst_len == 0 && route.table == ffi::RT_TABLE_MAIN)
        .map_or_else(ReachabilityFlags::empty, flags_for_route))
}

/// Maps a parsed route onto reachability flags.
fn flags_for_route(route: &RouteReply) -> ReachabilityFlags {
    let mut flags = ReachabilityFlags::REACHABLE;

    if !route.has_gateway {
        flags |= ReachabilityFlags::IS_DIRECT;
    }
    if route.route_type == ffi::RTN_LOCAL {
        flags |= ReachabilityFlags::IS_LOCAL_ADDRESS;
    }

    if let Some(oif) = route.oif {
        match interface_name(oif).map_or(LinkKind::Other, |name| interface_kind(&name)) {
            LinkKind::Cellular => flags |= ReachabilityFlags::IS_CELLULAR,
            LinkKind::Loopback => flags |= ReachabilityFlags::IS_LOCAL_ADDRESS,
            LinkKind::Wired | LinkKind::Wireless | LinkKind::Other => {}
        }
    }

    flags
}

/// Resolves an interface index to its name.
///
/// Excluded from coverage - queries live kernel interface state.
#[cfg(not(tarpaulin_include))]
fn interface_name(index: u32) -> Option<String> {
    let mut buf = [0u8; libc::IF_NAMESIZE];

    // SAFETY: buf is IF_NAMESIZE bytes as if_indextoname requires; the
    // returned pointer aliases buf and is only checked for null.
    let name = unsafe { libc::if_indextoname(index, buf.as_mut_ptr().cast::<libc::c_char>()) };
    if name.is_null() {
        return None;
    }

    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Some(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Classifies a link by its sysfs entry.
fn interface_kind(name: &str) -> LinkKind {
    interface_kind_at(Path::new("/sys/class/net"), name)
}

/// Classifies a link under the given sysfs root.
///
/// ARPHRD type codes identify loopback and PPP links; the `wireless`
/// subdirectory identifies Wi-Fi; WWAN links are recognized by their
/// conventional names.
fn interface_kind_at(sysfs: &Path, name: &str) -> LinkKind {
    let device = sysfs.join(name);

    let type_code = fs::read_to_string(device.join("type"))
        .ok()
        .and_then(|content| content.trim().parse::<u16>().ok());

    match type_code {
        Some(code) if code == libc::ARPHRD_LOOPBACK => return LinkKind::Loopback,
        Some(code) if code == libc::ARPHRD_PPP => return LinkKind::Cellular,
        _ => {}
    }

    if device.join("wireless").is_dir() {
        return LinkKind::Wireless;
    }
    if name.starts_with("wwan") || name.starts_with("rmnet") {
        return LinkKind::Cellular;
    }

    match type_code {
        Some(code) if code == libc::ARPHRD_ETHER => LinkKind::Wired,
        _ => LinkKind::Other,
    }
}

const RECV_BUF_LEN: usize = 32768;

/// A short-lived `NETLINK_ROUTE` socket.
struct NetlinkSocket {
    fd: libc::c_int,
}

impl NetlinkSocket {
    /// Opens and binds a route socket (no multicast groups).
    ///
    /// Excluded from coverage - requires a live kernel netlink socket.
    #[cfg(not(tarpaulin_include))]
    fn open() -> Result<Self, ProbeError> {
        // SAFETY: plain socket(2) call with constant arguments.
        let fd = unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                libc::NETLINK_ROUTE,
            )
        };
        if fd < 0 {
            return Err(last_os_error("open netlink socket"));
        }
        let socket = Self { fd };

        // SAFETY: sockaddr_nl is zero-initialized and valid for bind(2).
        let mut addr: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;

        // SAFETY: addr points to a valid sockaddr_nl of the given length.
        let rc = unsafe {
            libc::bind(
                socket.fd,
                std::ptr::from_ref(&addr).cast::<libc::sockaddr>(),
                std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(last_os_error("bind netlink socket"));
        }

        Ok(socket)
    }

    /// Excluded from coverage - requires a live kernel netlink socket.
    #[cfg(not(tarpaulin_include))]
    fn send(&self, buf: &[u8]) -> Result<(), ProbeError> {
        // SAFETY: buf is a valid slice for the given length.
        let sent = unsafe { libc::send(self.fd, buf.as_ptr().cast(), buf.len(), 0) };
        if sent < 0 {
            return Err(last_os_error("send netlink request"));
        }
        Ok(())
    }

    /// Excluded from coverage - requires a live kernel netlink socket.
    #[cfg(not(tarpaulin_include))]
    fn recv(&self, buf: &mut [u8]) -> Result<usize, ProbeError> {
        // SAFETY: buf is a valid mutable slice for the given length.
        let received = unsafe { libc::recv(self.fd, buf.as_mut_ptr().cast(), buf.len(), 0) };
        if received < 0 {
            return Err(last_os_error("receive netlink reply"));
        }
        // Non-negative after the check above.
        Ok(received.unsigned_abs())
    }
}

impl Drop for NetlinkSocket {
    fn drop(&mut self) {
        // SAFETY: fd is owned by this socket and closed exactly once.
        unsafe { libc::close(self.fd) };
    }
}

/// Maps the current errno onto a [`ProbeError`].
fn last_os_error(context: &str) -> ProbeError {
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(code) if code == libc::EPERM || code == libc::EACCES => ProbeError::PermissionDenied {
            context: context.to_string(),
        },
        _ => ProbeError::Platform {
            message: format!("{context}: {err}"),
        },
    }
}

/// Aligns a length to the 4-byte netlink boundary.
const fn nl_align(len: usize) -> usize {
    (len + 3) & !3
}

/// Views a plain C struct as bytes for message assembly.
fn struct_bytes<T>(value: &T) -> &[u8] {
    // SAFETY: T is a repr(C) netlink struct; every byte is initialized.
    unsafe {
        std::slice::from_raw_parts(std::ptr::from_ref(value).cast::<u8>(), std::mem::size_of::<T>())
    }
}

/// Reads a plain C struct from the front of a byte slice.
///
/// Caller must ensure `buf` holds at least `size_of::<T>()` bytes.
fn read_struct<T: Copy>(buf: &[u8]) -> T {
    debug_assert!(buf.len() >= std::mem::size_of::<T>());
    // SAFETY: length checked by the caller; read_unaligned tolerates any
    // alignment.
    unsafe { std::ptr::read_unaligned(buf.as_ptr().cast::<T>()) }
}

/// Builds an `RTM_GETROUTE` unicast lookup request for an address.
fn build_route_request(addr: IpAddr) -> Vec<u8> {
    let addr_bytes: Vec<u8> = match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    };

    let rta_len = std::mem::size_of::<ffi::rtattr>() + addr_bytes.len();
    let payload_len = std::mem::size_of::<ffi::rtmsg>() + nl_align(rta_len);
    let total_len = std::mem::size_of::<libc::nlmsghdr>() + payload_len;

    let header = libc::nlmsghdr {
        nlmsg_len: total_len as u32,
        nlmsg_type: libc::RTM_GETROUTE,
        nlmsg_flags: libc::NLM_F_REQUEST as u16,
        nlmsg_seq: 1,
        nlmsg_pid: 0,
    };

    let route = ffi::rtmsg {
        rtm_family: match addr {
            IpAddr::V4(_) => libc::AF_INET as u8,
            IpAddr::V6(_) => libc::AF_INET6 as u8,
        },
        rtm_dst_len: match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        },
        ..ffi::rtmsg::zeroed()
    };

    let attr = ffi::rtattr {
        rta_len: rta_len as u16,
        rta_type: ffi::RTA_DST,
    };

    let mut buf = Vec::with_capacity(total_len);
    buf.extend_from_slice(struct_bytes(&header));
    buf.extend_from_slice(struct_bytes(&route));
    buf.extend_from_slice(struct_bytes(&attr));
    buf.extend_from_slice(&addr_bytes);
    buf.resize(total_len, 0);
    buf
}

/// Builds an `RTM_GETROUTE` dump request for all routing tables.
fn build_route_dump_request() -> Vec<u8> {
    let total_len = std::mem::size_of::<libc::nlmsghdr>() + std::mem::size_of::<ffi::rtmsg>();

    let header = libc::nlmsghdr {
        nlmsg_len: total_len as u32,
        nlmsg_type: libc::RTM_GETROUTE,
        nlmsg_flags: (libc::NLM_F_REQUEST | libc::NLM_F_DUMP) as u16,
        nlmsg_seq: 1,
        nlmsg_pid: 0,
    };

    let route = ffi::rtmsg::zeroed();

    let mut buf = Vec::with_capacity(total_len);
    buf.extend_from_slice(struct_bytes(&header));
    buf.extend_from_slice(struct_bytes(&route));
    buf
}

/// Walks every netlink message in a reply buffer, collecting routes.
///
/// Returns the terminal outcome if the buffer contained one.
fn parse_reply(buf: &[u8], routes: &mut Vec<RouteReply>) -> Option<Terminal> {
    let header_len = std::mem::size_of::<libc::nlmsghdr>();
    let mut offset = 0;

    while offset + header_len <= buf.len() {
        let header: libc::nlmsghdr = read_struct(&buf[offset..]);
        let msg_len = header.nlmsg_len as usize;
        if msg_len < header_len || offset + msg_len > buf.len() {
            break;
        }

        match libc::c_int::from(header.nlmsg_type) {
            libc::NLMSG_DONE => return Some(Terminal::Done),
            libc::NLMSG_ERROR => {
                let payload = &buf[offset + header_len..offset + msg_len];
                if payload.len() >= std::mem::size_of::<i32>() {
                    let code: i32 = read_struct(payload);
                    if code != 0 {
                        return Some(Terminal::Error(code));
                    }
                }
            }
            code if code == libc::c_int::from(libc::RTM_NEWROUTE) => {
                let payload = &buf[offset + header_len..offset + msg_len];
                if let Some(route) = parse_route_message(payload) {
                    routes.push(route);
                }
            }
            _ => {}
        }

        offset += nl_align(msg_len);
    }

    None
}

/// Parses the `rtmsg` and attributes of a single `RTM_NEWROUTE` payload.
fn parse_route_message(payload: &[u8]) -> Option<RouteReply> {
    let rtmsg_len = std::mem::size_of::<ffi::rtmsg>();
    if payload.len() < rtmsg_len {
        return None;
    }
    let route: ffi::rtmsg = read_struct(payload);

    let mut reply = RouteReply {
        route_type: route.rtm_type,
        dst_len: route.rtm_dst_len,
        table: route.rtm_table,
        oif: None,
        has_gateway: false,
    };

    let attr_len = std::mem::size_of::<ffi::rtattr>();
    let mut offset = rtmsg_len;
    while offset + attr_len <= payload.len() {
        let attr: ffi::rtattr = read_struct(&payload[offset..]);
        let len = attr.rta_len as usize;
        if len < attr_len || offset + len > payload.len() {
            break;
        }

        match attr.rta_type {
            ffi::RTA_OIF if len >= attr_len + std::mem::size_of::<u32>() => {
                reply.oif = Some(read_struct(&payload[offset + attr_len..]));
            }
            ffi::RTA_GATEWAY => reply.has_gateway = true,
            _ => {}
        }

        offset += nl_align(len);
    }

    Some(reply)
}

/// rtnetlink structures and constants not exposed through libc.
#[allow(non_camel_case_types)]
mod ffi {
    #[repr(C)]
    #[derive(Debug, Clone, Copy)]
    pub struct rtmsg {
        pub rtm_family: u8,
        pub rtm_dst_len: u8,
        pub rtm_src_len: u8,
        pub rtm_tos: u8,
        pub rtm_table: u8,
        pub rtm_protocol: u8,
        pub rtm_scope: u8,
        pub rtm_type: u8,
        pub rtm_flags: u32,
    }

    impl rtmsg {
        pub const fn zeroed() -> Self {
            Self {
                rtm_family: 0,
                rtm_dst_len: 0,
                rtm_src_len: 0,
                rtm_tos: 0,
                rtm_table: 0,
                rtm_protocol: 0,
                rtm_scope: 0,
                rtm_type: 0,
                rtm_flags: 0,
            }
        }
    }

    #[repr(C)]
    #[derive(Debug, Clone, Copy)]
    pub struct rtattr {
        pub rta_len: u16,
        pub rta_type: u16,
    }

    pub const RTA_DST: u16 = 1;
    pub const RTA_OIF: u16 = 4;
    pub const RTA_GATEWAY: u16 = 5;

    pub const RTN_LOCAL: u8 = 2;
    pub const RT_TABLE_MAIN: u8 = 254;
}

#[cfg(test)]
#[path = "linux_test.rs"]
mod tests;
