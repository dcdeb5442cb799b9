//! Recording session provider for unit and integration testing.
//!
//! Every `open` is recorded together with the session it produced, so tests
//! can assert how many sessions were opened, closed and are still live, and
//! whether any session was closed more than once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::application::lease_registry::{
    LeaseSession, MappingRequest, SessionProvider, TransportError,
};

#[derive(Default)]
struct Faults {
    open: AtomicBool,
    close: AtomicBool,
    renew: AtomicBool,
}

#[derive(Default)]
struct SessionRecord {
    closes: AtomicUsize,
    renewals: AtomicUsize,
}

/// A [`SessionProvider`] that records every call instead of talking to a gateway.
pub struct RecordingProvider {
    faults: Arc<Faults>,
    requests: Mutex<Vec<MappingRequest>>,
    sessions: Mutex<Vec<Arc<SessionRecord>>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self {
            faults: Arc::new(Faults::default()),
            requests: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// Makes subsequent `open` calls fail with [`TransportError::Unreachable`].
    pub fn set_fail_open(&self, fail: bool) {
        self.faults.open.store(fail, Ordering::SeqCst);
    }

    /// Makes `close` fail on every session, including ones already open.
    pub fn set_fail_close(&self, fail: bool) {
        self.faults.close.store(fail, Ordering::SeqCst);
    }

    /// Makes `renew` fail on every session, including ones already open.
    pub fn set_fail_renew(&self, fail: bool) {
        self.faults.renew.store(fail, Ordering::SeqCst);
    }

    /// All successfully opened mapping requests, in call order.
    pub fn requests(&self) -> Vec<MappingRequest> {
        self.requests.lock().expect("lock poisoned").clone()
    }

    pub fn opened(&self) -> usize {
        self.sessions.lock().expect("lock poisoned").len()
    }

    /// Sessions closed at least once.
    pub fn closed(&self) -> usize {
        self.count_sessions(|s| s.closes.load(Ordering::SeqCst) > 0)
    }

    /// Sessions never closed.
    pub fn live(&self) -> usize {
        self.count_sessions(|s| s.closes.load(Ordering::SeqCst) == 0)
    }

    /// Highest number of successful closes seen on a single session.
    pub fn max_close_count(&self) -> usize {
        self.sessions
            .lock()
            .expect("lock poisoned")
            .iter()
            .map(|s| s.closes.load(Ordering::SeqCst))
            .max()
            .unwrap_or(0)
    }

    /// Total successful renewals across all sessions.
    pub fn renewals(&self) -> usize {
        self.sessions
            .lock()
            .expect("lock poisoned")
            .iter()
            .map(|s| s.renewals.load(Ordering::SeqCst))
            .sum()
    }

    fn count_sessions(&self, pred: impl Fn(&SessionRecord) -> bool) -> usize {
        self.sessions
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|s| pred(s))
            .count()
    }
}

impl Default for RecordingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionProvider for RecordingProvider {
    async fn open(&self, request: MappingRequest) -> Result<Box<dyn LeaseSession>, TransportError> {
        if self.faults.open.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable("injected open failure".to_string()));
        }

        let record = Arc::new(SessionRecord::default());
        self.requests.lock().expect("lock poisoned").push(request);
        self.sessions
            .lock()
            .expect("lock poisoned")
            .push(Arc::clone(&record));

        Ok(Box::new(RecordingSession {
            faults: Arc::clone(&self.faults),
            record,
        }))
    }
}

struct RecordingSession {
    faults: Arc<Faults>,
    record: Arc<SessionRecord>,
}

#[async_trait]
impl LeaseSession for RecordingSession {
    async fn close(&self) -> Result<(), TransportError> {
        // Give concurrent callers a chance to interleave, as a network round-trip would.
        tokio::task::yield_now().await;
        if self.faults.close.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("injected close failure".to_string()));
        }
        self.record.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn renew(&self) -> Result<(), TransportError> {
        if self.faults.renew.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("injected renew failure".to_string()));
        }
        self.record.renewals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
