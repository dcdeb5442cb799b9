//! LeaseRegistry: the table of published services and their live sessions.
//!
//! # Ownership
//!
//! The registry exclusively owns every [`LeaseSession`] it stores.  A session
//! leaves the table only after it has been closed, or on shutdown.  Callers
//! never see a session handle.
//!
//! # Locking
//!
//! The table lives behind a `tokio::sync::Mutex` that is held across the
//! provider calls.  Close-then-remove and close-before-replace therefore run
//! as one step with respect to every other registry operation, so a session
//! can never be closed twice and a descriptor never maps to two live sessions.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use beacon_core::{Protocol, ServiceDescriptor};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default prefix for mapping labels: `"Beacon Service (Minecraft)"`.
pub const DEFAULT_LABEL_PREFIX: &str = "Beacon Service";

/// Parameters of one port-mapping request sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRequest {
    pub local_address: IpAddr,
    pub port: u16,
    pub protocol: Protocol,
    pub label: String,
    /// `None` asks for a permanent mapping.
    pub lease_duration: Option<Duration>,
}

/// A failure talking to the gateway.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
    #[error("gateway unreachable: {0}")]
    Unreachable(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A live port-mapping session on the gateway.
#[async_trait]
pub trait LeaseSession: Send + Sync {
    /// Tears the mapping down.
    async fn close(&self) -> Result<(), TransportError>;

    /// Extends the lease.  Sessions for permanent mappings need not override this.
    async fn renew(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Opens port-mapping sessions on the gateway.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open(&self, request: MappingRequest) -> Result<Box<dyn LeaseSession>, TransportError>;
}

/// Errors returned by [`LeaseRegistry`] operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("service {0} is not published")]
    NotFound(ServiceDescriptor),
    #[error("transport failure for {descriptor}: {source}")]
    Transport {
        descriptor: ServiceDescriptor,
        #[source]
        source: TransportError,
    },
}

impl RegistryError {
    fn transport(descriptor: ServiceDescriptor, source: TransportError) -> Self {
        Self::Transport { descriptor, source }
    }
}

/// How sessions are labelled and for how long they are requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseSettings {
    pub label_prefix: String,
    pub lease_duration: Option<Duration>,
}

impl Default for LeaseSettings {
    fn default() -> Self {
        Self {
            label_prefix: DEFAULT_LABEL_PREFIX.to_string(),
            lease_duration: None,
        }
    }
}

impl LeaseSettings {
    /// Human-readable mapping label for `descriptor`.
    pub fn label_for(&self, descriptor: &ServiceDescriptor) -> String {
        format!("{} ({})", self.label_prefix, descriptor.display_name())
    }
}

/// Maps each published [`ServiceDescriptor`] to its live session.
pub struct LeaseRegistry {
    provider: Arc<dyn SessionProvider>,
    settings: LeaseSettings,
    sessions: Mutex<HashMap<ServiceDescriptor, Box<dyn LeaseSession>>>,
}

impl LeaseRegistry {
    pub fn new(provider: Arc<dyn SessionProvider>, settings: LeaseSettings) -> Self {
        Self {
            provider,
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Publishes `descriptor` on `address`.
    ///
    /// An existing session for an equal descriptor is closed before the new one
    /// is opened; both would claim the same external port.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Transport`] if closing the prior session fails; the
    ///   prior session stays published.
    /// - [`RegistryError::Transport`] if opening the new session fails; the
    ///   descriptor is left unpublished.
    pub async fn publish(
        &self,
        address: IpAddr,
        descriptor: ServiceDescriptor,
    ) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.lock().await;

        if let Some(previous) = sessions.get(&descriptor) {
            debug!("replacing existing session for {descriptor}");
            if let Err(e) = previous.close().await {
                warn!("could not close previous session for {descriptor}: {e}");
                return Err(RegistryError::transport(descriptor, e));
            }
            sessions.remove(&descriptor);
        }

        let request = MappingRequest {
            local_address: address,
            port: descriptor.port(),
            protocol: descriptor.protocol(),
            label: self.settings.label_for(&descriptor),
            lease_duration: self.settings.lease_duration,
        };

        let session = self
            .provider
            .open(request)
            .await
            .map_err(|e| RegistryError::transport(descriptor, e))?;
        sessions.insert(descriptor, session);

        info!("published {descriptor} on {address}");
        Ok(())
    }

    /// Closes and removes the session for `descriptor`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if `descriptor` is not published.
    /// - [`RegistryError::Transport`] if the close fails; the entry is kept.
    pub async fn unpublish(&self, descriptor: &ServiceDescriptor) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.lock().await;
        Self::close_and_remove(&mut sessions, descriptor).await?;
        info!("unpublished {descriptor}");
        Ok(())
    }

    async fn close_and_remove(
        sessions: &mut HashMap<ServiceDescriptor, Box<dyn LeaseSession>>,
        descriptor: &ServiceDescriptor,
    ) -> Result<(), RegistryError> {
        let session = sessions
            .get(descriptor)
            .ok_or(RegistryError::NotFound(*descriptor))?;
        session
            .close()
            .await
            .map_err(|e| RegistryError::transport(*descriptor, e))?;
        sessions.remove(descriptor);
        Ok(())
    }

    /// Unpublishes every service.
    ///
    /// Every key is attempted even when some closes fail.  Entries that were
    /// removed concurrently are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first close failure, after the whole pass has run.
    pub async fn shutdown_all(&self) -> Result<(), RegistryError> {
        info!("cleaning up all remaining services");

        let keys: Vec<ServiceDescriptor> = self.sessions.lock().await.keys().copied().collect();
        let mut first_failure = None;

        for descriptor in keys {
            let mut sessions = self.sessions.lock().await;
            match Self::close_and_remove(&mut sessions, &descriptor).await {
                Ok(()) => debug!("unpublished {descriptor}"),
                Err(RegistryError::NotFound(_)) => {}
                Err(e) => {
                    error!("failed to unpublish {descriptor}: {e}");
                    first_failure.get_or_insert(e);
                }
            }
        }

        match first_failure {
            None => {
                info!("all active services were un-published");
                Ok(())
            }
            Some(e) => Err(e),
        }
    }

    pub async fn contains(&self, descriptor: &ServiceDescriptor) -> bool {
        self.sessions.lock().await.contains_key(descriptor)
    }

    /// Snapshot of the currently published descriptors, in no particular order.
    pub async fn published(&self) -> Vec<ServiceDescriptor> {
        self.sessions.lock().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Renews every live session once.
    ///
    /// Failures are logged and returned; they never remove an entry.
    pub async fn renew_all(&self) -> Vec<RegistryError> {
        let sessions = self.sessions.lock().await;
        let mut failures = Vec::new();

        for (descriptor, session) in sessions.iter() {
            match session.renew().await {
                Ok(()) => debug!("renewed lease for {descriptor}"),
                Err(e) => {
                    error!("failed to renew lease for {descriptor}: {e}");
                    failures.push(RegistryError::transport(*descriptor, e));
                }
            }
        }

        failures
    }

    /// Starts a background task that calls [`renew_all`](Self::renew_all)
    /// every `interval`.  The first renewal happens one interval from now.
    ///
    /// Returns `None` for a zero `interval`.
    pub fn spawn_renewal(self: &Arc<Self>, interval: Duration) -> Option<RenewalHandle> {
        if interval.is_zero() {
            warn!("lease renewal disabled: zero interval");
            return None;
        }

        let registry = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.renew_all().await;
            }
        });
        info!("lease renewal every {}s", interval.as_secs_f64());
        Some(RenewalHandle { task })
    }
}

/// Owns the renewal task; dropping it stops renewal.
#[derive(Debug)]
pub struct RenewalHandle {
    task: JoinHandle<()>,
}

impl RenewalHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for RenewalHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
