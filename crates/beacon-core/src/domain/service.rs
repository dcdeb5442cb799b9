//! Service descriptors: the values that identify a published lease.
//!
//! A [`ServiceDescriptor`] is the key of the daemon's lease registry.  Two
//! descriptors are equal (and hash identically) when their full field tuple
//! `(display_name, logo_ref, port, protocol)` is equal, regardless of where or
//! when they were constructed.  In particular two [`CustomService`] values with
//! the same port and protocol are the *same* key:
//!
//! ```
//! use beacon_core::{CustomService, Protocol, ServiceDescriptor};
//!
//! let a = ServiceDescriptor::from(CustomService::new(Protocol::Udp, 28015).unwrap());
//! let b = ServiceDescriptor::from(CustomService::new(Protocol::Udp, 28015).unwrap());
//! assert_eq!(a, b);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::NonZeroU16;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display name shared by every custom service.
pub const CUSTOM_DISPLAY_NAME: &str = "Custom";

/// Logo shown for custom services.
pub const CUSTOM_LOGO_REF: &str = "image/logo.png";

/// Errors raised while building a descriptor from user input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// Port 0 cannot be forwarded.
    #[error("port must be in the range 1-65535")]
    ZeroPort,

    /// The id does not name an entry of the stock catalog.
    #[error("unknown stock service: {0}")]
    UnknownStockService(String),

    /// The protocol string is neither `tcp` nor `udp`.
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),
}

/// Transport protocol of a forwarded port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("TCP"),
            Protocol::Udp => f.write_str("UDP"),
        }
    }
}

impl FromStr for Protocol {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(DescriptorError::UnknownProtocol(s.to_string())),
        }
    }
}

/// Well-known services that can be published with a single click.
///
/// The catalog is a compile-time constant; see [`StockService::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockService {
    Minecraft,
    CsGo,
    KillingFloor2,
    Rust,
    Starbound,
}

impl StockService {
    /// Every catalog entry, in display order.
    pub const ALL: [StockService; 5] = [
        StockService::Minecraft,
        StockService::CsGo,
        StockService::KillingFloor2,
        StockService::Rust,
        StockService::Starbound,
    ];

    /// Short identifier used in configuration files (e.g. `"rust"`).
    pub fn id(self) -> &'static str {
        match self {
            StockService::Minecraft => "minecraft",
            StockService::CsGo => "csgo",
            StockService::KillingFloor2 => "kf2",
            StockService::Rust => "rust",
            StockService::Starbound => "starbound",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StockService::Minecraft => "Minecraft",
            StockService::CsGo => "Counter-Strike: Global Offensive",
            StockService::KillingFloor2 => "Killing Floor 2",
            StockService::Rust => "Rust",
            StockService::Starbound => "Starbound",
        }
    }

    pub fn logo_ref(self) -> &'static str {
        match self {
            StockService::Minecraft => "image/service/minecraft.png",
            StockService::CsGo => "image/service/csgo.png",
            StockService::KillingFloor2 => "image/service/kf2.png",
            StockService::Rust => "image/service/rust.png",
            StockService::Starbound => "image/service/starbound.png",
        }
    }

    pub fn port(self) -> u16 {
        match self {
            StockService::Minecraft => 25565,
            StockService::CsGo => 27015,
            StockService::KillingFloor2 => 7777,
            StockService::Rust => 28015,
            StockService::Starbound => 21025,
        }
    }

    pub fn protocol(self) -> Protocol {
        match self {
            StockService::Minecraft | StockService::Starbound => Protocol::Tcp,
            StockService::CsGo | StockService::KillingFloor2 | StockService::Rust => Protocol::Udp,
        }
    }

    /// Resolves a catalog entry by its [`id`](Self::id), ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::UnknownStockService`] when no entry matches.
    pub fn from_id(id: &str) -> Result<Self, DescriptorError> {
        Self::ALL
            .into_iter()
            .find(|s| s.id().eq_ignore_ascii_case(id))
            .ok_or_else(|| DescriptorError::UnknownStockService(id.to_string()))
    }
}

/// A service assembled from a caller-supplied port and protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomService {
    protocol: Protocol,
    port: NonZeroU16,
}

impl CustomService {
    /// Creates a custom service.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::ZeroPort`] if `port` is 0.
    pub fn new(protocol: Protocol, port: u16) -> Result<Self, DescriptorError> {
        let port = NonZeroU16::new(port).ok_or(DescriptorError::ZeroPort)?;
        Ok(Self { protocol, port })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn port(&self) -> u16 {
        self.port.get()
    }
}

/// Identifies a service that can be published on the gateway.
#[derive(Debug, Clone, Copy)]
pub enum ServiceDescriptor {
    Stock(StockService),
    Custom(CustomService),
}

impl ServiceDescriptor {
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceDescriptor::Stock(s) => s.display_name(),
            ServiceDescriptor::Custom(_) => CUSTOM_DISPLAY_NAME,
        }
    }

    pub fn logo_ref(&self) -> &'static str {
        match self {
            ServiceDescriptor::Stock(s) => s.logo_ref(),
            ServiceDescriptor::Custom(_) => CUSTOM_LOGO_REF,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            ServiceDescriptor::Stock(s) => s.port(),
            ServiceDescriptor::Custom(c) => c.port(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            ServiceDescriptor::Stock(s) => s.protocol(),
            ServiceDescriptor::Custom(c) => c.protocol(),
        }
    }

    /// The tuple that defines descriptor identity.
    fn key(&self) -> (&'static str, &'static str, u16, Protocol) {
        (self.display_name(), self.logo_ref(), self.port(), self.protocol())
    }
}

impl PartialEq for ServiceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ServiceDescriptor {}

impl Hash for ServiceDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.display_name(), self.port(), self.protocol())
    }
}

impl From<StockService> for ServiceDescriptor {
    fn from(s: StockService) -> Self {
        ServiceDescriptor::Stock(s)
    }
}

impl From<CustomService> for ServiceDescriptor {
    fn from(c: CustomService) -> Self {
        ServiceDescriptor::Custom(c)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
