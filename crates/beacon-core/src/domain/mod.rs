//! Domain entities for Beacon.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//! Code in the daemon's application and infrastructure layers depends on these
//! types, but nothing here depends on them.

/// Service descriptors and the stock service catalog.
pub mod service;

/// Interface capability flags and the eligibility filter chain.
pub mod interface;
