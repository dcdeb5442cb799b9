//! Process termination signals.
//!
//! On Unix both SIGINT (Ctrl-C) and SIGTERM (`kill`, service managers) end the
//! daemon.  Elsewhere only Ctrl-C is watched.  Handlers are registered in
//! [`ShutdownSignal::install`], so a signal arriving before
//! [`recv`](ShutdownSignal::recv) is awaited is not lost.

use std::io;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// The signal that ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Interrupt,
    Terminate,
}

pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
}

impl ShutdownSignal {
    /// Registers the signal handlers.
    ///
    /// # Errors
    ///
    /// Returns the OS error if a handler cannot be registered.
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Waits for the next termination signal.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> io::Result<Shutdown> {
        tokio::select! {
            _ = self.interrupt.recv() => Ok(Shutdown::Interrupt),
            _ = self.terminate.recv() => Ok(Shutdown::Terminate),
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> io::Result<Shutdown> {
        tokio::signal::ctrl_c().await.map(|()| Shutdown::Interrupt)
    }
}
