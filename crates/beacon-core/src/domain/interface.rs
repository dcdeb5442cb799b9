//! Interface eligibility: which local adapters may carry an announcement.
//!
//! Port-mapping discovery relies on multicast, so only interfaces that are up
//! and multicast-capable are useful.  Loopback adapters are never useful but
//! are not an error either, so they are dropped without a skip reason.
//!
//! The predicates are evaluated in a fixed order so that an interface failing
//! several of them always reports the same reason:
//!
//! ```text
//! up? ──► multicast? ──► loopback? ──► virtual? ──► point-to-point? ──► Eligible
//!  │          │              │             │               │
//! Down   NoMulticast     (silent)       Virtual      PointToPoint
//! ```

use std::fmt;

/// Capability flags reported by the OS for one interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterfaceFlags {
    /// Administratively up.
    pub is_up: bool,
    pub supports_multicast: bool,
    pub is_loopback: bool,
    /// Alias / sub-interface of a physical adapter.
    pub is_virtual: bool,
    pub is_point_to_point: bool,
}

/// Why an interface was rejected by the filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    Down,
    NoMulticast,
    Virtual,
    PointToPoint,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SkipReason::Down => "device is offline",
            SkipReason::NoMulticast => "device does not support multicast",
            SkipReason::Virtual => "device is virtual",
            SkipReason::PointToPoint => "device is a point-to-point device",
        };
        f.write_str(msg)
    }
}

/// Outcome of [`check_eligibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// Loopback adapters are dropped silently.
    Loopback,
    Skipped(SkipReason),
}

/// Applies the ordered filter chain to `flags`.
pub fn check_eligibility(flags: &InterfaceFlags) -> Eligibility {
    if !flags.is_up {
        return Eligibility::Skipped(SkipReason::Down);
    }
    if !flags.supports_multicast {
        return Eligibility::Skipped(SkipReason::NoMulticast);
    }
    if flags.is_loopback {
        return Eligibility::Loopback;
    }
    if flags.is_virtual {
        return Eligibility::Skipped(SkipReason::Virtual);
    }
    if flags.is_point_to_point {
        return Eligibility::Skipped(SkipReason::PointToPoint);
    }
    Eligibility::Eligible
}

// ── Tests ─────────────────────────────────────────────────────────────────────
