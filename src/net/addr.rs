use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs};

use tracing::trace;

use crate::error::{Result, SocketError};

/// Resolve a hostname or dotted quad literal into an IPv4 socket address. Only IPv4 results are
/// considered, an empty host or a name without any IPv4 address yields
/// [SocketError::InvalidAddress].
pub fn resolve(host: impl AsRef<str>, port: u16) -> Result<SocketAddrV4> {
    let host = host.as_ref();
    if host.is_empty() {
        return Err(SocketError::InvalidAddress);
    }

    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(SocketAddrV4::new(ip, port));
    }

    // Resolver failures only carry an OS code when the lookup itself hit a system error,
    // everything else is a bad name.
    let addrs = (host, port).to_socket_addrs().map_err(|e| match e.raw_os_error() {
        Some(code) if code != 0 => SocketError::from(code),
        _ => SocketError::InvalidAddress,
    })?;

    let addr = addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or(SocketError::InvalidAddress)?;

    trace!(host, addr = %addr, "resolved host");
    Ok(addr)
}

/// Like [resolve], but an empty host selects the wildcard address `0.0.0.0`.
pub fn resolve_or_any(host: impl AsRef<str>, port: u16) -> Result<SocketAddrV4> {
    match host.as_ref() {
        "" => Ok(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)),
        host => resolve(host, port),
    }
}

/// Parse a local interface literal, empty meaning any interface.
pub(super) fn parse_interface(iface: &str) -> Result<Ipv4Addr> {
    match iface {
        "" => Ok(Ipv4Addr::UNSPECIFIED),
        iface => iface.parse().map_err(|_| SocketError::InvalidAddress),
    }
}

/// Parse a multicast group literal, rejecting anything outside 224.0.0.0/4.
pub(super) fn parse_group(group: &str) -> Result<Ipv4Addr> {
    let group: Ipv4Addr = group.parse().map_err(|_| SocketError::InvalidAddress)?;
    if !group.is_multicast() {
        return Err(SocketError::InvalidAddress);
    }
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_addresses() {
        let addr = resolve("127.0.0.1", 8080).unwrap();
        assert_eq!(addr, SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8080));
    }

    #[test]
    fn empty_host() {
        assert_eq!(resolve("", 80), Err(SocketError::InvalidAddress));
        assert_eq!(
            resolve_or_any("", 80),
            Ok(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 80))
        );
    }

    #[test]
    fn unresolvable_host() {
        let err = resolve("no-such-host.invalid", 80).unwrap_err();
        assert!(!err.is_success());
    }

    #[test]
    fn multicast_groups() {
        assert_eq!(parse_group("239.255.0.1"), Ok(Ipv4Addr::new(239, 255, 0, 1)));
        assert_eq!(parse_group("10.0.0.1"), Err(SocketError::InvalidAddress));
        assert_eq!(parse_group("not-an-ip"), Err(SocketError::InvalidAddress));
    }

    #[test]
    fn interfaces() {
        assert_eq!(parse_interface(""), Ok(Ipv4Addr::UNSPECIFIED));
        assert_eq!(parse_interface("127.0.0.1"), Ok(Ipv4Addr::LOCALHOST));
        assert_eq!(parse_interface("eth0"), Err(SocketError::InvalidAddress));
    }
}
