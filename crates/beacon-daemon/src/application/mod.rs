//! Application layer use cases for the daemon.
//!
//! Use cases in this layer orchestrate `beacon_core` values and depend only on
//! the collaborator traits they declare (`InterfaceEnumerator`,
//! `SessionProvider`).  They contain no OS calls and no network I/O; the
//! infrastructure layer supplies the implementations.
//!
//! # Sub-modules
//!
//! - **`interface_catalog`** – Enumerates local interfaces, applies the
//!   eligibility filter chain, and caches the surviving list.  The cache is
//!   swapped wholesale on every successful refresh.
//!
//! - **`lease_registry`** – Maps each published `ServiceDescriptor` to the one
//!   live protocol session backing it, and tears sessions down on unpublish or
//!   shutdown.

pub mod interface_catalog;
pub mod lease_registry;
