//! Beacon daemon entry point.
//!
//! Publishes the configured services on the gateway-facing interface and
//! keeps them published until Ctrl-C or SIGTERM.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()
//!  └─ InterfaceCatalog::refresh()   -- PnetEnumerator
//!  └─ choose interface + address    -- preferred, else recommended
//!  └─ LeaseRegistry::publish() × N  -- DryRunProvider
//!  └─ spawn_renewal()               -- only when configured
//!  └─ SIGINT / SIGTERM → shutdown_all()
//! ```

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use beacon_core::ServiceDescriptor;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use beacon_daemon::application::interface_catalog::{InterfaceCatalog, NetworkInterfaceDescriptor};
use beacon_daemon::application::lease_registry::LeaseRegistry;
use beacon_daemon::infrastructure::gateway::dry_run::DryRunProvider;
use beacon_daemon::infrastructure::network::{pnet_enumerator::PnetEnumerator, primary_local_address};
use beacon_daemon::infrastructure::signal::ShutdownSignal;
use beacon_daemon::infrastructure::storage::config::{self, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loaded = config::load_config();

    // `RUST_LOG` wins over the configured level.
    let level = loaded
        .as_ref()
        .map(|cfg| cfg.beacon.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    let config = loaded.unwrap_or_else(|e| {
        warn!("using default configuration: {e}");
        AppConfig::default()
    });

    info!("Beacon starting");

    let services = config
        .service_descriptors()
        .context("invalid [[services]] entry")?;
    if services.is_empty() {
        warn!("no services configured; nothing to publish");
    }

    // ── Interface selection ───────────────────────────────────────────────────
    let catalog = InterfaceCatalog::new(Arc::new(PnetEnumerator::new()));
    let report = catalog.refresh()?;
    info!(
        "{} eligible interface(s), {} skipped",
        report.accepted.len(),
        report.skipped.len()
    );

    let interface = choose_interface(&catalog, &config)?;
    let address = catalog
        .find_compatible_address(&interface)
        .ok_or_else(|| anyhow!("interface {} has no bound address", interface.name()))?;
    info!("publishing on {} ({address})", interface.display_name());

    // ── Publication ───────────────────────────────────────────────────────────
    let registry = Arc::new(LeaseRegistry::new(
        Arc::new(DryRunProvider::new()),
        config.leases.settings(),
    ));

    if let Err(e) = publish_all(&registry, address, &services).await {
        error!("publication failed: {e:#}");
        if let Err(cleanup) = registry.shutdown_all().await {
            error!("cleanup after failed publication also failed: {cleanup}");
        }
        return Err(e);
    }

    let renewal = config
        .leases
        .renewal_interval()
        .and_then(|interval| registry.spawn_renewal(interval));

    info!("Beacon ready.  Press Ctrl-C to exit.");
    wait_for_shutdown().await;

    if let Some(handle) = renewal {
        handle.stop();
    }
    registry.shutdown_all().await?;

    info!("Beacon stopped");
    Ok(())
}

/// Returns on SIGINT or SIGTERM.  A listener failure also returns so that
/// leases are still cleaned up.
async fn wait_for_shutdown() {
    let mut signals = match ShutdownSignal::install() {
        Ok(signals) => signals,
        Err(e) => {
            error!("could not install signal handlers: {e}");
            return;
        }
    };
    match signals.recv().await {
        Ok(kind) => info!("shutdown signal received ({kind:?})"),
        Err(e) => error!("failed to listen for shutdown signals: {e}"),
    }
}

fn choose_interface(
    catalog: &InterfaceCatalog,
    config: &AppConfig,
) -> anyhow::Result<NetworkInterfaceDescriptor> {
    if let Some(name) = &config.network.preferred_interface {
        return catalog
            .find(name)
            .ok_or_else(|| anyhow!("preferred interface {name} is not eligible or does not exist"));
    }

    let local = match primary_local_address() {
        Ok(addr) => Some(addr),
        Err(e) => {
            warn!("could not determine the default route: {e}");
            None
        }
    };
    catalog
        .recommended(local)
        .ok_or_else(|| anyhow!("no eligible network interface found"))
}

async fn publish_all(
    registry: &LeaseRegistry,
    address: IpAddr,
    services: &[ServiceDescriptor],
) -> anyhow::Result<()> {
    for descriptor in services {
        registry
            .publish(address, *descriptor)
            .await
            .with_context(|| format!("failed to publish {descriptor}"))?;
    }
    Ok(())
}
