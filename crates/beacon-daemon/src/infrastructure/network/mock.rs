//! Scripted interface enumeration for tests.
//!
//! Allows tests to describe a host's adapters without touching the OS.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use beacon_core::InterfaceFlags;

use crate::application::interface_catalog::{
    EnumerationError, InspectionError, InterfaceEnumerator, InterfaceHandle,
};

/// A fake adapter whose flags and addresses can be changed at any time.
#[derive(Debug)]
pub struct MockInterface {
    name: String,
    flags: Mutex<Result<InterfaceFlags, InspectionError>>,
    addresses: Mutex<Vec<IpAddr>>,
}

impl MockInterface {
    pub fn new(name: &str, flags: InterfaceFlags) -> Self {
        Self {
            name: name.to_string(),
            flags: Mutex::new(Ok(flags)),
            addresses: Mutex::new(Vec::new()),
        }
    }

    /// An adapter that is up and multicast-capable.
    pub fn healthy(name: &str) -> Self {
        Self::new(
            name,
            InterfaceFlags {
                is_up: true,
                supports_multicast: true,
                ..InterfaceFlags::default()
            },
        )
    }

    pub fn with_addresses(self, addresses: &[IpAddr]) -> Self {
        self.set_addresses(addresses);
        self
    }

    pub fn set_addresses(&self, addresses: &[IpAddr]) {
        *self.addresses.lock().expect("lock poisoned") = addresses.to_vec();
    }

    /// Makes [`flags`](InterfaceHandle::flags) fail as if the adapter vanished.
    pub fn set_vanished(&self) {
        *self.flags.lock().expect("lock poisoned") =
            Err(InspectionError::Vanished(self.name.clone()));
    }
}

impl InterfaceHandle for MockInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn flags(&self) -> Result<InterfaceFlags, InspectionError> {
        self.flags.lock().expect("lock poisoned").clone()
    }

    fn addresses(&self) -> Result<Vec<IpAddr>, InspectionError> {
        Ok(self.addresses.lock().expect("lock poisoned").clone())
    }
}

/// Returns a scripted interface list, or fails on demand.
#[derive(Default)]
pub struct MockEnumerator {
    interfaces: Mutex<Vec<Arc<MockInterface>>>,
    failing: AtomicBool,
}

impl MockEnumerator {
    pub fn new(interfaces: Vec<Arc<MockInterface>>) -> Self {
        Self {
            interfaces: Mutex::new(interfaces),
            failing: AtomicBool::new(false),
        }
    }

    /// Replaces the interface set returned by the next enumeration.
    pub fn set_interfaces(&self, interfaces: Vec<Arc<MockInterface>>) {
        *self.interfaces.lock().expect("lock poisoned") = interfaces;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl InterfaceEnumerator for MockEnumerator {
    fn enumerate(&self) -> Result<Vec<Arc<dyn InterfaceHandle>>, EnumerationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EnumerationError::Platform(
                "injected enumeration failure".to_string(),
            ));
        }
        Ok(self
            .interfaces
            .lock()
            .expect("lock poisoned")
            .iter()
            .map(|i| Arc::clone(i) as Arc<dyn InterfaceHandle>)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_enumerator_returns_scripted_interfaces() {
        // Arrange
        let eth0 = Arc::new(MockInterface::healthy("eth0"));
        let enumerator = MockEnumerator::new(vec![eth0]);

        // Act
        let handles = enumerator.enumerate().unwrap();

        // Assert
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].name(), "eth0");
    }

    #[test]
    fn test_mock_enumerator_fails_on_demand() {
        let enumerator = MockEnumerator::new(Vec::new());
        enumerator.set_failing(true);
        assert!(enumerator.enumerate().is_err());
    }

    #[test]
    fn test_mock_interface_vanishes() {
        let eth0 = MockInterface::healthy("eth0");
        eth0.set_vanished();
        assert_eq!(
            eth0.flags(),
            Err(InspectionError::Vanished("eth0".to_string()))
        );
    }
}
