//! Infrastructure layer for the daemon.
//!
//! Contains OS-facing adapters: interface enumeration, gateway session
//! providers, file-system storage, and termination signals.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `beacon_core`, but production code in `application` MUST NOT import it.

pub mod gateway;
pub mod network;
pub mod signal;
pub mod storage;
