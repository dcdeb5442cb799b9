//! A session provider that performs no network I/O.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::application::lease_registry::{
    LeaseSession, MappingRequest, SessionProvider, TransportError,
};

/// Logs every mapping it is asked to open and counts live sessions.
#[derive(Debug, Default)]
pub struct DryRunProvider {
    live: Arc<AtomicUsize>,
}

impl DryRunProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions opened and not yet closed.
    pub fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for DryRunProvider {
    async fn open(&self, request: MappingRequest) -> Result<Box<dyn LeaseSession>, TransportError> {
        let id = Uuid::new_v4();
        match request.lease_duration {
            Some(d) => info!(
                "[dry-run] open {id}: {}:{}/{} \"{}\" for {}s",
                request.local_address,
                request.port,
                request.protocol,
                request.label,
                d.as_secs()
            ),
            None => info!(
                "[dry-run] open {id}: {}:{}/{} \"{}\" (permanent)",
                request.local_address, request.port, request.protocol, request.label
            ),
        }
        self.live.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(DryRunSession {
            id,
            request,
            live: Arc::clone(&self.live),
        }))
    }
}

struct DryRunSession {
    id: Uuid,
    request: MappingRequest,
    live: Arc<AtomicUsize>,
}

#[async_trait]
impl LeaseSession for DryRunSession {
    async fn close(&self) -> Result<(), TransportError> {
        info!(
            "[dry-run] close {}: {}/{}",
            self.id, self.request.port, self.request.protocol
        );
        self.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn renew(&self) -> Result<(), TransportError> {
        info!("[dry-run] renew {}: {}", self.id, self.request.label);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::Protocol;
    use std::time::Duration;

    #[tokio::test]
    async fn test_dry_run_provider_tracks_live_sessions() {
        // Arrange
        let provider = DryRunProvider::new();
        let request = MappingRequest {
            local_address: "192.168.1.20".parse().unwrap(),
            port: 25565,
            protocol: Protocol::Tcp,
            label: "Beacon Service (Minecraft)".to_string(),
            lease_duration: Some(Duration::from_secs(120)),
        };

        // Act
        let session = provider.open(request).await.unwrap();
        let live_after_open = provider.live_sessions();
        session.renew().await.unwrap();
        session.close().await.unwrap();

        // Assert
        assert_eq!(live_after_open, 1);
        assert_eq!(provider.live_sessions(), 0);
    }
}
