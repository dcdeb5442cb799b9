//! Interface enumeration backed by `pnet::datalink`.

use std::net::IpAddr;
use std::sync::Arc;

use beacon_core::InterfaceFlags;
use pnet::datalink::{self, NetworkInterface};

use crate::application::interface_catalog::{
    EnumerationError, InspectionError, InterfaceEnumerator, InterfaceHandle,
};

/// Lists the host's interfaces with `pnet::datalink::interfaces()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PnetEnumerator;

impl PnetEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl InterfaceEnumerator for PnetEnumerator {
    fn enumerate(&self) -> Result<Vec<Arc<dyn InterfaceHandle>>, EnumerationError> {
        to_handles(datalink::interfaces())
    }
}

/// `pnet` reports a failed OS query as an empty list.  Every host has at
/// least a loopback adapter, so an empty list is treated as that failure.
fn to_handles(
    interfaces: Vec<NetworkInterface>,
) -> Result<Vec<Arc<dyn InterfaceHandle>>, EnumerationError> {
    if interfaces.is_empty() {
        return Err(EnumerationError::Platform(
            "the OS reported no network interfaces".to_string(),
        ));
    }
    Ok(interfaces
        .into_iter()
        .map(|iface| Arc::new(PnetInterface::from(iface)) as Arc<dyn InterfaceHandle>)
        .collect())
}

/// One interface as reported by `pnet` at enumeration time.
///
/// Flags come from that snapshot; [`addresses`](InterfaceHandle::addresses)
/// queries the OS again so address changes are picked up.
#[derive(Debug, Clone)]
pub struct PnetInterface {
    name: String,
    display_name: String,
    flags: InterfaceFlags,
}

impl From<NetworkInterface> for PnetInterface {
    fn from(iface: NetworkInterface) -> Self {
        let flags = InterfaceFlags {
            is_up: iface.is_up(),
            supports_multicast: iface.is_multicast(),
            is_loopback: iface.is_loopback(),
            is_virtual: is_alias(&iface.name),
            is_point_to_point: iface.is_point_to_point(),
        };
        let display_name = if iface.description.trim().is_empty() {
            iface.name.clone()
        } else {
            iface.description.clone()
        };
        Self {
            name: iface.name,
            display_name,
            flags,
        }
    }
}

/// `eth0:1` style names denote an alias of a physical adapter.
fn is_alias(name: &str) -> bool {
    name.contains(':')
}

impl InterfaceHandle for PnetInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn flags(&self) -> Result<InterfaceFlags, InspectionError> {
        Ok(self.flags)
    }

    fn addresses(&self) -> Result<Vec<IpAddr>, InspectionError> {
        datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == self.name)
            .map(|iface| iface.ips.iter().map(|net| net.ip()).collect())
            .ok_or_else(|| InspectionError::Vanished(self.name.clone()))
    }
}
