use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::PlaylogResult;
use crate::store::base::EventStore;
use crate::types::Store;

#[derive(Debug, Default)]
struct Inner {
    store: Option<Store>,
    writes: usize,
}

/// In-memory [`EventStore`].
///
/// Clones share the same state, so a test can keep a handle to inspect what a syncer wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `store`.
    pub fn with_store(store: Store) -> Self {
        let inner = Inner {
            store: Some(store),
            writes: 0,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Returns a copy of the current store.
    pub fn current(&self) -> Option<Store> {
        self.lock().store.clone()
    }

    /// Returns how many writes succeeded.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventStore for MemoryEventStore {
    fn read(&self) -> PlaylogResult<Option<Store>> {
        Ok(self.lock().store.clone())
    }

    fn write(&self, store: &Store) -> PlaylogResult<()> {
        let mut inner = self.lock();
        inner.store = Some(store.clone());
        inner.writes += 1;

        Ok(())
    }
}
