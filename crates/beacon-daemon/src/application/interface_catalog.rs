//! InterfaceCatalog: the cached list of interfaces a service may be published on.
//!
//! # Refresh policy
//!
//! A refresh builds the new list completely and then swaps it in under a
//! write lock.  Readers of [`InterfaceCatalog::current_list`] therefore see
//! either the previous complete list or the new complete list, never an empty
//! or half-populated one.  When the OS query itself fails the previous list is
//! kept: a partial enumeration cannot be trusted as complete.
//!
//! Failures while probing a single interface are logged and that interface is
//! skipped; the rest of the batch still goes through the filter chain.

use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, PoisonError, RwLock};

use beacon_core::{check_eligibility, Eligibility, InterfaceFlags, SkipReason};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// The OS-level interface query failed as a whole.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("platform interface query failed: {0}")]
    Platform(String),
    #[error("i/o error while listing interfaces: {0}")]
    Io(#[from] std::io::Error),
}

/// A single interface could not be probed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InspectionError {
    /// The interface disappeared between enumeration and probing.
    #[error("interface {0} is no longer present")]
    Vanished(String),
}

/// Errors surfaced by [`InterfaceCatalog::refresh`].
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not retrieve list of devices: {0}")]
    Enumeration(#[from] EnumerationError),
}

/// A raw interface as returned by the enumeration provider.
pub trait InterfaceHandle: Send + Sync + fmt::Debug {
    /// System name, e.g. `eth0` or `en0`.
    fn name(&self) -> &str;

    /// Human-readable name; falls back to [`name`](Self::name) where the OS has none.
    fn display_name(&self) -> &str;

    /// Probes the capability flags.
    ///
    /// # Errors
    ///
    /// Returns [`InspectionError`] if the OS cannot report the flags.
    fn flags(&self) -> Result<InterfaceFlags, InspectionError>;

    /// Queries the addresses currently bound to the interface, in OS order.
    ///
    /// # Errors
    ///
    /// Returns [`InspectionError`] if the OS cannot report the addresses.
    fn addresses(&self) -> Result<Vec<IpAddr>, InspectionError>;
}

/// Lists every interface visible to the operating system.
#[cfg_attr(test, mockall::automock)]
pub trait InterfaceEnumerator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`EnumerationError`] if the OS query fails.
    fn enumerate(&self) -> Result<Vec<Arc<dyn InterfaceHandle>>, EnumerationError>;
}

/// An interface that passed the filter chain.
///
/// Flags are captured at refresh time; addresses are queried on demand.
#[derive(Debug, Clone)]
pub struct NetworkInterfaceDescriptor {
    handle: Arc<dyn InterfaceHandle>,
    flags: InterfaceFlags,
}

impl NetworkInterfaceDescriptor {
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn display_name(&self) -> &str {
        self.handle.display_name()
    }

    pub fn flags(&self) -> InterfaceFlags {
        self.flags
    }

    /// Queries the currently bound addresses.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`InspectionError`].
    pub fn addresses(&self) -> Result<Vec<IpAddr>, InspectionError> {
        self.handle.addresses()
    }
}

/// What happened to each interface during a refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Names of the interfaces now in the catalog, in enumeration order.
    pub accepted: Vec<String>,
    /// Interfaces rejected by a capability predicate, one entry each.
    pub skipped: Vec<(String, SkipReason)>,
    /// Interfaces that could not be probed.
    pub failed: Vec<(String, InspectionError)>,
}

impl RefreshReport {
    /// Returns the skip reason recorded for `name`, if any.
    pub fn skip_reason(&self, name: &str) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, reason)| *reason)
    }
}

/// Enumerates, filters and caches eligible network interfaces.
pub struct InterfaceCatalog {
    enumerator: Arc<dyn InterfaceEnumerator>,
    interfaces: RwLock<Arc<[NetworkInterfaceDescriptor]>>,
}

impl InterfaceCatalog {
    /// Creates an empty catalog.  Call [`refresh`](Self::refresh) to populate it.
    pub fn new(enumerator: Arc<dyn InterfaceEnumerator>) -> Self {
        Self {
            enumerator,
            interfaces: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Re-enumerates the OS interfaces and replaces the cached list.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Enumeration`] when the OS query fails; the
    /// previously cached list is left untouched in that case.
    pub fn refresh(&self) -> Result<RefreshReport, CatalogError> {
        let handles = self.enumerator.enumerate().map_err(|e| {
            error!("could not retrieve list of devices: {e}");
            CatalogError::Enumeration(e)
        })?;

        let mut report = RefreshReport::default();
        let mut accepted = Vec::with_capacity(handles.len());

        for handle in handles {
            info!(
                "inspecting {} (interface {})",
                handle.display_name(),
                handle.name()
            );

            let flags = match handle.flags() {
                Ok(flags) => flags,
                Err(e) => {
                    warn!("skipping {}: {e}", handle.display_name());
                    report.failed.push((handle.name().to_string(), e));
                    continue;
                }
            };

            match check_eligibility(&flags) {
                Eligibility::Eligible => {
                    report.accepted.push(handle.name().to_string());
                    accepted.push(NetworkInterfaceDescriptor { handle, flags });
                }
                Eligibility::Loopback => {
                    debug!("skipping loopback device {}", handle.display_name());
                }
                Eligibility::Skipped(reason) => {
                    info!("skipping {}: {reason}", handle.display_name());
                    report.skipped.push((handle.name().to_string(), reason));
                }
            }
        }

        *self
            .interfaces
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::from(accepted);

        Ok(report)
    }

    /// Returns the list as of the last successful refresh.
    pub fn current_list(&self) -> Arc<[NetworkInterfaceDescriptor]> {
        Arc::clone(
            &self
                .interfaces
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Looks up a cached interface by system name.
    pub fn find(&self, name: &str) -> Option<NetworkInterfaceDescriptor> {
        self.current_list()
            .iter()
            .find(|i| i.name() == name)
            .cloned()
    }

    /// Returns the first address bound to `interface`, or `None` if it has none.
    ///
    /// An interface whose addresses cannot be queried is treated as having none.
    pub fn find_compatible_address(&self, interface: &NetworkInterfaceDescriptor) -> Option<IpAddr> {
        match interface.addresses() {
            Ok(addresses) => addresses.into_iter().next(),
            Err(e) => {
                warn!("could not query addresses of {}: {e}", interface.display_name());
                None
            }
        }
    }

    /// Suggests the interface most likely to reach the gateway.
    ///
    /// Prefers the cached interface that carries `local_address`, then the
    /// first cached interface.
    pub fn recommended(&self, local_address: Option<IpAddr>) -> Option<NetworkInterfaceDescriptor> {
        let list = self.current_list();

        let gateway_facing = local_address.and_then(|local| {
            list.iter().find(|i| {
                i.addresses()
                    .map(|addrs| addrs.contains(&local))
                    .unwrap_or(false)
            })
        });

        gateway_facing.or_else(|| list.first()).cloned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::Sequence;

    #[derive(Debug)]
    struct StubInterface {
        name: String,
        flags: Result<InterfaceFlags, InspectionError>,
        addresses: Vec<IpAddr>,
    }

    impl InterfaceHandle for StubInterface {
        fn name(&self) -> &str {
            &self.name
        }

        fn display_name(&self) -> &str {
            &self.name
        }

        fn flags(&self) -> Result<InterfaceFlags, InspectionError> {
            self.flags.clone()
        }

        fn addresses(&self) -> Result<Vec<IpAddr>, InspectionError> {
            Ok(self.addresses.clone())
        }
    }

    fn up_multicast() -> InterfaceFlags {
        InterfaceFlags {
            is_up: true,
            supports_multicast: true,
            ..InterfaceFlags::default()
        }
    }

    fn stub(name: &str, flags: InterfaceFlags, addresses: &[&str]) -> Arc<dyn InterfaceHandle> {
        Arc::new(StubInterface {
            name: name.to_string(),
            flags: Ok(flags),
            addresses: addresses.iter().map(|a| a.parse().unwrap()).collect(),
        })
    }

    fn catalog_returning(handles: Vec<Arc<dyn InterfaceHandle>>) -> InterfaceCatalog {
        let mut mock = MockInterfaceEnumerator::new();
        mock.expect_enumerate()
            .returning(move || Ok(handles.clone()));
        InterfaceCatalog::new(Arc::new(mock))
    }

    #[test]
    fn test_new_catalog_is_empty() {
        let catalog = catalog_returning(Vec::new());
        assert!(catalog.current_list().is_empty());
    }

    #[test]
    fn test_refresh_keeps_only_up_multicast_non_loopback() {
        // Arrange: [loopback, down-but-multicast, up-and-multicast]
        let catalog = catalog_returning(vec![
            stub(
                "lo",
                InterfaceFlags {
                    is_loopback: true,
                    ..up_multicast()
                },
                &["127.0.0.1"],
            ),
            stub(
                "eth1",
                InterfaceFlags {
                    is_up: false,
                    ..up_multicast()
                },
                &[],
            ),
            stub("eth0", up_multicast(), &["192.168.1.20"]),
        ]);

        // Act
        let report = catalog.refresh().expect("refresh");

        // Assert
        let list = catalog.current_list();
        let names: Vec<&str> = list.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["eth0"]);
        assert_eq!(report.accepted, vec!["eth0".to_string()]);
        assert_eq!(report.skip_reason("eth1"), Some(SkipReason::Down));
        assert_eq!(report.skip_reason("lo"), None, "loopback records no reason");
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_refresh_preserves_enumeration_order() {
        let catalog = catalog_returning(vec![
            stub("wlan0", up_multicast(), &[]),
            stub("eth0", up_multicast(), &[]),
            stub("eth1", up_multicast(), &[]),
        ]);

        catalog.refresh().expect("refresh");

        let list = catalog.current_list();
        let names: Vec<&str> = list.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["wlan0", "eth0", "eth1"]);
    }

    #[test]
    fn test_inspection_failure_skips_only_that_interface() {
        // Arrange
        let broken: Arc<dyn InterfaceHandle> = Arc::new(StubInterface {
            name: "eth9".to_string(),
            flags: Err(InspectionError::Vanished("eth9".to_string())),
            addresses: Vec::new(),
        });
        let catalog = catalog_returning(vec![broken, stub("eth0", up_multicast(), &[])]);

        // Act
        let report = catalog.refresh().expect("a single failing probe must not abort the batch");

        // Assert
        assert_eq!(catalog.current_list().len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "eth9");
    }

    #[test]
    fn test_enumeration_failure_keeps_previous_list() {
        // Arrange: first call succeeds, second fails.
        let mut mock = MockInterfaceEnumerator::new();
        let mut seq = Sequence::new();
        mock.expect_enumerate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![stub("eth0", up_multicast(), &["10.0.0.5"])]));
        mock.expect_enumerate()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(EnumerationError::Platform("netlink closed".to_string())));
        let catalog = InterfaceCatalog::new(Arc::new(mock));
        catalog.refresh().expect("first refresh");

        // Act
        let result = catalog.refresh();

        // Assert
        assert!(matches!(result, Err(CatalogError::Enumeration(_))));
        assert_eq!(catalog.current_list().len(), 1);
        assert_eq!(catalog.current_list()[0].name(), "eth0");
    }

    #[test]
    fn test_refresh_calls_enumerator_once_per_refresh() {
        let mut mock = MockInterfaceEnumerator::new();
        mock.expect_enumerate().times(2).returning(|| Ok(Vec::new()));
        let catalog = InterfaceCatalog::new(Arc::new(mock));

        catalog.refresh().expect("first");
        catalog.refresh().expect("second");
    }

    #[test]
    fn test_find_compatible_address_returns_first_address() {
        let catalog = catalog_returning(vec![stub(
            "eth0",
            up_multicast(),
            &["10.0.0.5", "fe80::1"],
        )]);
        catalog.refresh().expect("refresh");
        let eth0 = catalog.find("eth0").expect("eth0 cached");

        let first = catalog.find_compatible_address(&eth0);
        let again = catalog.find_compatible_address(&eth0);

        assert_eq!(first, Some("10.0.0.5".parse().unwrap()));
        assert_eq!(first, again);
    }

    #[test]
    fn test_find_compatible_address_returns_none_without_addresses() {
        let catalog = catalog_returning(vec![stub("eth0", up_multicast(), &[])]);
        catalog.refresh().expect("refresh");
        let eth0 = catalog.find("eth0").expect("eth0 cached");

        assert_eq!(catalog.find_compatible_address(&eth0), None);
    }

    #[test]
    fn test_recommended_prefers_interface_carrying_local_address() {
        let catalog = catalog_returning(vec![
            stub("wlan0", up_multicast(), &["10.1.0.2"]),
            stub("eth0", up_multicast(), &["192.168.1.20"]),
        ]);
        catalog.refresh().expect("refresh");

        let chosen = catalog.recommended(Some("192.168.1.20".parse().unwrap()));

        assert_eq!(chosen.map(|i| i.name().to_string()), Some("eth0".to_string()));
    }

    #[test]
    fn test_recommended_falls_back_to_first_interface() {
        let catalog = catalog_returning(vec![
            stub("wlan0", up_multicast(), &["10.1.0.2"]),
            stub("eth0", up_multicast(), &["192.168.1.20"]),
        ]);
        catalog.refresh().expect("refresh");

        let chosen = catalog.recommended(Some("172.16.0.9".parse().unwrap()));

        assert_eq!(chosen.map(|i| i.name().to_string()), Some("wlan0".to_string()));
    }

    #[test]
    fn test_recommended_is_none_for_empty_catalog() {
        let catalog = catalog_returning(Vec::new());
        catalog.refresh().expect("refresh");
        assert!(catalog.recommended(None).is_none());
    }
}
