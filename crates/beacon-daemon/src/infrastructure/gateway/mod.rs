//! Gateway session providers.
//!
//! The port-mapping wire protocol is an external capability; this module only
//! holds implementations of [`SessionProvider`](crate::application::lease_registry::SessionProvider)
//! that do not speak it:
//!
//! - [`dry_run::DryRunProvider`] logs each mapping it is asked for and hands
//!   out sessions with random ids.  The binary uses it until a real protocol
//!   client is plugged in.
//! - [`mock::RecordingProvider`] records every request and session lifecycle
//!   event for tests, with switchable failure injection.

pub mod dry_run;
pub mod mock;
