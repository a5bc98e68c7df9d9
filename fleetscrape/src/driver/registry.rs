//! Per-run registry of open sessions.
//!
//! Each session holds a [`SessionLease`] for as long as its transport
//! process may be alive; dropping the lease removes the entry. The registry
//! records the highest number of simultaneously open sessions, which is how
//! a run's concurrency bound is observed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use indexmap::IndexMap;
use log::trace;

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    open: IndexMap<u64, (String, Instant)>,
    peak: usize,
    total: usize,
}

/// Live sessions of one run.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an opening session for `hostname`.
    pub fn open(&self, hostname: &str) -> SessionLease {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.open.insert(id, (hostname.to_string(), Instant::now()));
        state.total += 1;
        state.peak = state.peak.max(state.open.len());

        SessionLease {
            id,
            registry: self.clone(),
        }
    }

    /// Number of sessions currently open.
    pub fn active(&self) -> usize {
        self.lock().open.len()
    }

    /// Highest number of simultaneously open sessions.
    pub fn peak(&self) -> usize {
        self.lock().peak
    }

    /// Number of sessions opened since the registry was created.
    pub fn total_opened(&self) -> usize {
        self.lock().total
    }

    fn release(&self, id: u64) {
        if let Some((hostname, opened)) = self.lock().open.shift_remove(&id) {
            trace!("{}: session lease released after {:?}", hostname, opened.elapsed());
        }
    }
}

/// Registration of one open session. Released on drop.
#[derive(Debug)]
pub struct SessionLease {
    id: u64,
    registry: SessionRegistry,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}
