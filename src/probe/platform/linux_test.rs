//! Tests for the netlink route probe.

use super::*;

mod message_building {
    use super::*;

    #[test]
    fn v4_request_has_expected_length() {
        let buf = build_route_request("192.168.1.1".parse().unwrap());

        let header: libc::nlmsghdr = read_struct(&buf);
        assert_eq!(header.nlmsg_len as usize, buf.len());
        assert_eq!(header.nlmsg_type, libc::RTM_GETROUTE);

        // header + rtmsg + aligned(rtattr + 4 address bytes)
        let expected = std::mem::size_of::<libc::nlmsghdr>()
            + std::mem::size_of::<ffi::rtmsg>()
            + nl_align(std::mem::size_of::<ffi::rtattr>() + 4);
        assert_eq!(buf.len(), expected);
    }

    #[test]
    fn v6_request_carries_sixteen_address_bytes() {
        let buf = build_route_request("::1".parse().unwrap());

        let expected = std::mem::size_of::<libc::nlmsghdr>()
            + std::mem::size_of::<ffi::rtmsg>()
            + nl_align(std::mem::size_of::<ffi::rtattr>() + 16);
        assert_eq!(buf.len(), expected);
    }

    #[test]
    fn dump_request_sets_dump_flag() {
        let buf = build_route_dump_request();

        let header: libc::nlmsghdr = read_struct(&buf);
        let flags = libc::c_int::from(header.nlmsg_flags);
        assert_eq!(flags & libc::NLM_F_DUMP, libc::NLM_F_DUMP);
    }
}

mod reply_parsing {
    use super::*;

    /// Assembles a single netlink message from parts.
    fn make_message(msg_type: u16, payload: &[u8]) -> Vec<u8> {
        let total = std::mem::size_of::<libc::nlmsghdr>() + payload.len();
        let header = libc::nlmsghdr {
            nlmsg_len: total as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: 0,
            nlmsg_seq: 1,
            nlmsg_pid: 0,
        };

        let mut buf = Vec::with_capacity(nl_align(total));
        buf.extend_from_slice(struct_bytes(&header));
        buf.extend_from_slice(payload);
        buf.resize(nl_align(total), 0);
        buf
    }

    /// Assembles an RTM_NEWROUTE payload with the given attributes.
    fn make_route_payload(route: ffi::rtmsg, attrs: &[(u16, Vec<u8>)]) -> Vec<u8> {
        let mut payload = struct_bytes(&route).to_vec();
        for (rta_type, value) in attrs {
            let rta_len = std::mem::size_of::<ffi::rtattr>() + value.len();
            let attr = ffi::rtattr {
                rta_len: rta_len as u16,
                rta_type: *rta_type,
            };
            payload.extend_from_slice(struct_bytes(&attr));
            payload.extend_from_slice(value);
            payload.resize(payload.len() + nl_align(rta_len) - rta_len, 0);
        }
        payload
    }

    #[test]
    fn parses_route_with_oif_and_gateway() {
        let mut route = ffi::rtmsg::zeroed();
        route.rtm_table = ffi::RT_TABLE_MAIN;
        let payload = make_route_payload(
            route,
            &[
                (ffi::RTA_OIF, 3u32.to_ne_bytes().to_vec()),
                (ffi::RTA_GATEWAY, vec![192, 168, 1, 254]),
            ],
        );
        let buf = make_message(libc::RTM_NEWROUTE, &payload);

        let mut routes = Vec::new();
        let terminal = parse_reply(&buf, &mut routes);

        assert_eq!(terminal, None);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].oif, Some(3));
        assert!(routes[0].has_gateway);
        assert_eq!(routes[0].table, ffi::RT_TABLE_MAIN);
    }

    #[test]
    fn error_message_yields_terminal_error() {
        let code: i32 = -libc::ENETUNREACH;
        let buf = make_message(libc::NLMSG_ERROR as u16, &code.to_ne_bytes());

        let mut routes = Vec::new();
        let terminal = parse_reply(&buf, &mut routes);

        assert_eq!(terminal, Some(Terminal::Error(-libc::ENETUNREACH)));
        assert!(routes.is_empty());
    }

    #[test]
    fn ack_is_not_a_terminal_error() {
        let code: i32 = 0;
        let buf = make_message(libc::NLMSG_ERROR as u16, &code.to_ne_bytes());

        let mut routes = Vec::new();
        assert_eq!(parse_reply(&buf, &mut routes), None);
    }

    #[test]
    fn done_message_terminates_dump() {
        let buf = make_message(libc::NLMSG_DONE as u16, &[]);

        let mut routes = Vec::new();
        assert_eq!(parse_reply(&buf, &mut routes), Some(Terminal::Done));
    }

    #[test]
    fn multiple_messages_in_one_buffer_are_all_parsed() {
        let route = ffi::rtmsg::zeroed();
        let payload = make_route_payload(route, &[(ffi::RTA_OIF, 1u32.to_ne_bytes().to_vec())]);

        let mut buf = make_message(libc::RTM_NEWROUTE, &payload);
        buf.extend_from_slice(&make_message(libc::RTM_NEWROUTE, &payload));
        buf.extend_from_slice(&make_message(libc::NLMSG_DONE as u16, &[]));

        let mut routes = Vec::new();
        let terminal = parse_reply(&buf, &mut routes);

        assert_eq!(terminal, Some(Terminal::Done));
        assert_eq!(routes.len(), 2);
    }

    #[test]
    fn truncated_buffer_is_ignored() {
        let mut routes = Vec::new();
        assert_eq!(parse_reply(&[0u8; 3], &mut routes), None);
        assert!(routes.is_empty());
    }
}

mod flag_mapping {
    use super::*;

    #[test]
    fn gatewayless_route_is_direct() {
        let route = RouteReply {
            route_type: 0,
            dst_len: 32,
            table: ffi::RT_TABLE_MAIN,
            oif: None,
            has_gateway: false,
        };

        let flags = flags_for_route(&route);
        assert!(flags.is_reachable());
        assert!(flags.is_direct());
    }

    #[test]
    fn gateway_route_is_not_direct() {
        let route = RouteReply {
            route_type: 0,
            dst_len: 0,
            table: ffi::RT_TABLE_MAIN,
            oif: None,
            has_gateway: true,
        };

        let flags = flags_for_route(&route);
        assert!(flags.is_reachable());
        assert!(!flags.is_direct());
    }

    #[test]
    fn local_route_sets_local_address() {
        let route = RouteReply {
            route_type: ffi::RTN_LOCAL,
            dst_len: 32,
            table: ffi::RT_TABLE_MAIN,
            oif: None,
            has_gateway: false,
        };

        assert!(flags_for_route(&route).is_local_address());
    }
}

mod interface_classification {
    use super::*;
    use std::path::Path;

    fn write_type(dir: &Path, name: &str, code: u16) {
        let device = dir.join(name);
        std::fs::create_dir_all(&device).unwrap();
        std::fs::write(device.join("type"), format!("{code}\n")).unwrap();
    }

    #[test]
    fn loopback_type_code_classifies_loopback() {
        let dir = tempfile::tempdir().unwrap();
        write_type(dir.path(), "lo", libc::ARPHRD_LOOPBACK);

        assert_eq!(interface_kind_at(dir.path(), "lo"), LinkKind::Loopback);
    }

    #[test]
    fn ppp_type_code_classifies_cellular() {
        let dir = tempfile::tempdir().unwrap();
        write_type(dir.path(), "ppp0", libc::ARPHRD_PPP);

        assert_eq!(interface_kind_at(dir.path(), "ppp0"), LinkKind::Cellular);
    }

    #[test]
    fn wireless_directory_classifies_wireless() {
        let dir = tempfile::tempdir().unwrap();
        write_type(dir.path(), "wlan0", libc::ARPHRD_ETHER);
        std::fs::create_dir_all(dir.path().join("wlan0/wireless")).unwrap();

        assert_eq!(interface_kind_at(dir.path(), "wlan0"), LinkKind::Wireless);
    }

    #[test]
    fn wwan_name_classifies_cellular() {
        let dir = tempfile::tempdir().unwrap();
        write_type(dir.path(), "wwan0", libc::ARPHRD_ETHER);

        assert_eq!(interface_kind_at(dir.path(), "wwan0"), LinkKind::Cellular);
    }

    #[test]
    fn ether_type_code_classifies_wired() {
        let dir = tempfile::tempdir().unwrap();
        write_type(dir.path(), "eth0", libc::ARPHRD_ETHER);

        assert_eq!(interface_kind_at(dir.path(), "eth0"), LinkKind::Wired);
    }

    #[test]
    fn missing_entry_classifies_other() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(interface_kind_at(dir.path(), "nope0"), LinkKind::Other);
    }
}

mod live_kernel {
    use super::*;

    #[test]
    fn loopback_address_is_reachable_and_local() {
        let probe = NetlinkRouteProbe::new();
        let flags = probe
            .probe(&Target::Address("127.0.0.1".parse().unwrap()))
            .unwrap();

        assert!(flags.is_reachable());
        assert!(flags.is_local_address());
    }

    #[test]
    fn unresolvable_host_reads_as_not_reachable() {
        let probe = NetlinkRouteProbe::new();
        let flags = probe
            .probe(&Target::Host("host.invalid".to_string()))
            .unwrap();

        assert_eq!(flags, ReachabilityFlags::empty());
        assert!(!flags.is_reachable());
    }

    #[test]
    fn default_route_probe_succeeds() {
        let probe = NetlinkRouteProbe::new();

        // Whether a default route exists depends on the environment; the
        // query itself must succeed either way.
        assert!(probe.probe(&Target::DefaultRoute).is_ok());
    }
}
