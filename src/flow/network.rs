//! Address classification for always-allowed internal traffic.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Whether `ip` is in a private, loopback, link-local or otherwise reserved
/// range. Unparseable input is not private.
pub fn is_private_or_reserved(ip: &str) -> bool {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => is_reserved_v4(&v4),
        Ok(IpAddr::V6(v6)) => is_reserved_v6(&v6),
        Err(_) => false,
    }
}

fn is_reserved_v4(ip: &Ipv4Addr) -> bool {
    let [a, b, _, _] = ip.octets();
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_multicast()
        || a == 0
        // shared address space (carrier-grade NAT)
        || (a == 100 && (64..128).contains(&b))
        // reserved for future use
        || a >= 240
}

fn is_reserved_v6(ip: &Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_reserved_v4(&mapped);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        // unique local fc00::/7
        || (first & 0xfe00) == 0xfc00
        // link local fe80::/10
        || (first & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_v4() {
        assert!(is_private_or_reserved("10.0.0.1"));
        assert!(is_private_or_reserved("172.16.4.2"));
        assert!(is_private_or_reserved("192.168.1.100"));
        assert!(is_private_or_reserved("127.0.0.1"));
        assert!(is_private_or_reserved("169.254.10.10"));
        assert!(is_private_or_reserved("100.64.0.1"));
        assert!(is_private_or_reserved("255.255.255.255"));
        assert!(is_private_or_reserved("0.0.0.0"));
    }

    #[test]
    fn test_public_v4() {
        assert!(!is_private_or_reserved("1.2.3.4"));
        assert!(!is_private_or_reserved("17.253.144.10"));
        assert!(!is_private_or_reserved("100.128.0.1"));
    }

    #[test]
    fn test_v6() {
        assert!(is_private_or_reserved("::1"));
        assert!(is_private_or_reserved("fe80::1"));
        assert!(is_private_or_reserved("fd12:3456::1"));
        assert!(is_private_or_reserved("::ffff:192.168.0.1"));
        assert!(!is_private_or_reserved("2607:f8b0:4005:80b::200e"));
    }

    #[test]
    fn test_unparseable() {
        assert!(!is_private_or_reserved("safe.com"));
        assert!(!is_private_or_reserved(""));
    }
}
