//! Port and LAN address discovery

use crate::error::Result;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use tracing::debug;

/// Ask the OS for a free TCP port on all interfaces
///
/// The probe socket is released before returning, so another process may
/// take the port before the server binds it.
pub fn find_free_port() -> Result<u16> {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))?;
    let port = listener.local_addr()?.port();
    debug!("OS assigned free port {}", port);
    Ok(port)
}

/// First non-loopback IPv4 address in enumeration order
pub fn first_lan_ipv4<I>(addrs: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = IpAddr>,
{
    addrs.into_iter().find_map(|ip| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() => Some(v4),
        _ => None,
    })
}

/// First non-loopback IPv4 address of this host's interfaces
pub fn lan_ipv4() -> Option<Ipv4Addr> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => first_lan_ipv4(interfaces.into_iter().map(|iface| iface.ip())),
        Err(e) => {
            debug!("Interface enumeration failed: {}", e);
            None
        }
    }
}

/// Format `<ip>:<port>`, falling back to `0.0.0.0:<port>`
pub fn format_reachable(ip: Option<Ipv4Addr>, port: u16) -> String {
    let ip = ip.unwrap_or(Ipv4Addr::UNSPECIFIED);
    SocketAddr::from((ip, port)).to_string()
}
