//! Network infrastructure: OS interface enumeration.
//!
//! - [`pnet_enumerator::PnetEnumerator`] lists interfaces through `pnet::datalink`.
//! - [`mock::MockEnumerator`] serves a scripted interface set for tests.
//!
//! [`primary_local_address`] finds the address the OS would use for outbound
//! traffic, which identifies the gateway-facing interface.

pub mod mock;
pub mod pnet_enumerator;

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

/// TEST-NET-1 address; `connect` on UDP only consults the routing table.
const ROUTE_PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 9);

/// Returns the local address of the default route.
///
/// No packets are sent.
///
/// # Errors
///
/// Returns an I/O error when the host has no route to the probe address.
pub fn primary_local_address() -> io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(ROUTE_PROBE)?;
    Ok(socket.local_addr()?.ip())
}
