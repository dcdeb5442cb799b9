//! TOML-based configuration persistence for the daemon.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Beacon\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/beacon/config.toml` or `~/.config/beacon/config.toml`
//! - macOS:    `~/Library/Application Support/Beacon/config.toml`
//!
//! Example:
//!
//! ```toml
//! [beacon]
//! log_level = "debug"
//!
//! [network]
//! preferred_interface = "eth0"
//!
//! [leases]
//! label_prefix = "Beacon Service"
//! lease_duration_secs = 120
//! renewal_interval_secs = 30
//!
//! [[services]]
//! stock = "rust"
//!
//! [[services]]
//! protocol = "udp"
//! port = 28016
//! ```
//!
//! # Serde default values
//!
//! Every section and field may be omitted; missing values fall back to the
//! defaults below, so a fresh install runs without any file at all.

use std::path::{Path, PathBuf};
use std::time::Duration;

use beacon_core::{CustomService, DescriptorError, Protocol, ServiceDescriptor, StockService};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::lease_registry::{LeaseSettings, DEFAULT_LABEL_PREFIX};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub beacon: BeaconConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub leases: LeaseConfig,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

impl AppConfig {
    /// Converts every `[[services]]` entry into a descriptor.
    ///
    /// # Errors
    ///
    /// Returns the first entry that does not describe a valid service.
    pub fn service_descriptors(&self) -> Result<Vec<ServiceDescriptor>, DescriptorError> {
        self.services.iter().map(ServiceDescriptor::try_from).collect()
    }
}

/// General daemon settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeaconConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// System name of the interface to publish on.  When absent the
    /// gateway-facing interface is chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_interface: Option<String>,
}

/// How mappings are requested from the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaseConfig {
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,
    /// Requested lease lifetime.  Absent means a permanent mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_duration_secs: Option<u64>,
    /// Renewal period.  Absent or zero disables renewal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_interval_secs: Option<u64>,
}

impl LeaseConfig {
    pub fn settings(&self) -> LeaseSettings {
        LeaseSettings {
            label_prefix: self.label_prefix.clone(),
            lease_duration: self.lease_duration_secs.map(Duration::from_secs),
        }
    }

    pub fn renewal_interval(&self) -> Option<Duration> {
        self.renewal_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// One `[[services]]` entry: a stock service id, or a protocol and port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ServiceEntry {
    Stock { stock: String },
    Custom { protocol: String, port: u16 },
}

impl TryFrom<&ServiceEntry> for ServiceDescriptor {
    type Error = DescriptorError;

    fn try_from(entry: &ServiceEntry) -> Result<Self, Self::Error> {
        match entry {
            ServiceEntry::Stock { stock } => Ok(StockService::from_id(stock)?.into()),
            ServiceEntry::Custom { protocol, port } => {
                let protocol: Protocol = protocol.parse()?;
                Ok(CustomService::new(protocol, *port)?.into())
            }
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_label_prefix() -> String {
    DEFAULT_LABEL_PREFIX.to_string()
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            label_prefix: default_label_prefix(),
            lease_duration_secs: None,
            renewal_interval_secs: None,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the `Beacon` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Beacon"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("beacon"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Beacon")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("beacon-config-{}", uuid::Uuid::new_v4()))
            .join("config.toml")
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_values() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.beacon.log_level, "info");
        assert_eq!(cfg.leases.label_prefix, "Beacon Service");
        assert_eq!(cfg.leases.lease_duration_secs, None);
        assert_eq!(cfg.network.preferred_interface, None);
        assert!(cfg.services.is_empty());
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_toml_fills_missing_fields() {
        // Arrange
        let text = r#"
            [leases]
            lease_duration_secs = 120
        "#;

        // Act
        let cfg: AppConfig = toml::from_str(text).expect("parse");

        // Assert
        assert_eq!(cfg.leases.label_prefix, "Beacon Service");
        assert_eq!(cfg.leases.settings().lease_duration, Some(Duration::from_secs(120)));
        assert_eq!(cfg.beacon.log_level, "info");
    }

    // ── Services ──────────────────────────────────────────────────────────────

    #[test]
    fn test_services_parse_stock_and_custom_entries() {
        // Arrange
        let text = r#"
            [[services]]
            stock = "rust"

            [[services]]
            protocol = "UDP"
            port = 28016
        "#;

        // Act
        let cfg: AppConfig = toml::from_str(text).expect("parse");
        let descriptors = cfg.service_descriptors().expect("valid services");

        // Assert
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0], ServiceDescriptor::from(StockService::Rust));
        assert_eq!(
            descriptors[1],
            ServiceDescriptor::from(CustomService::new(Protocol::Udp, 28016).unwrap())
        );
    }

    #[test]
    fn test_unknown_stock_id_is_rejected() {
        let entry = ServiceEntry::Stock {
            stock: "quake".to_string(),
        };
        assert_eq!(
            ServiceDescriptor::try_from(&entry),
            Err(DescriptorError::UnknownStockService("quake".to_string()))
        );
    }

    #[test]
    fn test_zero_port_custom_entry_is_rejected() {
        let entry = ServiceEntry::Custom {
            protocol: "tcp".to_string(),
            port: 0,
        };
        assert_eq!(
            ServiceDescriptor::try_from(&entry),
            Err(DescriptorError::ZeroPort)
        );
    }

    // ── Leases ────────────────────────────────────────────────────────────────

    #[test]
    fn test_zero_renewal_interval_disables_renewal() {
        let leases = LeaseConfig {
            renewal_interval_secs: Some(0),
            ..LeaseConfig::default()
        };
        assert_eq!(leases.renewal_interval(), None);
    }

    #[test]
    fn test_renewal_interval_converts_to_duration() {
        let leases = LeaseConfig {
            renewal_interval_secs: Some(30),
            ..LeaseConfig::default()
        };
        assert_eq!(leases.renewal_interval(), Some(Duration::from_secs(30)));
    }

    // ── File I/O ──────────────────────────────────────────────────────────────

    #[test]
    fn test_load_missing_file_returns_default() {
        let cfg = load_config_from(&scratch_path()).expect("missing file is not an error");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_then_load_preserves_config() {
        // Arrange
        let path = scratch_path();
        let mut cfg = AppConfig::default();
        cfg.network.preferred_interface = Some("eth0".to_string());
        cfg.leases.renewal_interval_secs = Some(30);
        cfg.services.push(ServiceEntry::Stock {
            stock: "minecraft".to_string(),
        });

        // Act
        save_config_to(&path, &cfg).expect("save");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[leases\nlabel_prefix = ").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_config_file_path_ends_with_beacon_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("beacon/config.toml"));
        }
    }
}
