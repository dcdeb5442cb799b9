//! # beacon-core
//!
//! Shared domain library for Beacon containing the service descriptors, the
//! stock service catalog, and the interface eligibility rules.
//!
//! This crate has zero dependencies on OS APIs, sockets, or the port-mapping
//! protocol.  Everything in it can be compiled and tested on any platform.
//!
//! # Architecture overview
//!
//! Beacon publishes port-forwarding leases ("services") on the local
//! gateway so that game servers and similar software running on this machine
//! can be reached from the internet.  The daemon crate owns the live state;
//! this crate defines the values that flow through it:
//!
//! - **`domain::service`** – What can be published.  A [`ServiceDescriptor`]
//!   is either one of the well-known [`StockService`]s or a
//!   [`CustomService`] built from a user-supplied port and protocol.
//!   Descriptors have value semantics and are used as registry keys.
//!
//! - **`domain::interface`** – Which local network interfaces may carry an
//!   announcement.  [`check_eligibility`] applies the ordered filter chain to a
//!   set of [`InterfaceFlags`] and reports the first [`SkipReason`].

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `beacon_core::ServiceDescriptor` instead of the full module path.
pub use domain::interface::{check_eligibility, Eligibility, InterfaceFlags, SkipReason};
pub use domain::service::{
    CustomService, DescriptorError, Protocol, ServiceDescriptor, StockService,
};
