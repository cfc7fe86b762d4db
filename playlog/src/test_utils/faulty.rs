use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};

use crate::error::{ErrorKind, PlaylogResult};
use crate::oplog::OperationalLog;
use crate::playlog_error;
use crate::source::EventSource;
use crate::store::EventStore;
use crate::store::memory::MemoryEventStore;
use crate::types::{RawEvent, Store};

/// Source whose every fetch fails with the configured kind.
#[derive(Debug, Clone)]
pub struct FailingEventSource {
    kind: ErrorKind,
}

impl FailingEventSource {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl EventSource for FailingEventSource {
    fn fetch_recent(&self, _limit: usize) -> PlaylogResult<Vec<RawEvent>> {
        Err(playlog_error!(self.kind, "Injected source failure"))
    }
}

/// Store that reads from a [`MemoryEventStore`] but rejects every write.
#[derive(Debug, Clone, Default)]
pub struct ReadOnlyEventStore {
    inner: MemoryEventStore,
    rejected: Arc<AtomicUsize>,
}

impl ReadOnlyEventStore {
    pub fn new(inner: MemoryEventStore) -> Self {
        Self {
            inner,
            rejected: Default::default(),
        }
    }

    /// Returns how many writes were rejected.
    pub fn rejected_writes(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }
}

impl EventStore for ReadOnlyEventStore {
    fn read(&self) -> PlaylogResult<Option<Store>> {
        self.inner.read()
    }

    fn write(&self, _store: &Store) -> PlaylogResult<()> {
        self.rejected.fetch_add(1, Ordering::SeqCst);
        Err(playlog_error!(
            ErrorKind::StoreWriteFailed,
            "Injected store write failure"
        ))
    }
}

/// Store that silently drops the last row of every write.
#[derive(Debug, Clone, Default)]
pub struct LossyEventStore {
    inner: MemoryEventStore,
}

impl EventStore for LossyEventStore {
    fn read(&self) -> PlaylogResult<Option<Store>> {
        self.inner.read()
    }

    fn write(&self, store: &Store) -> PlaylogResult<()> {
        let mut rows = store.rows().to_vec();
        rows.pop();
        let truncated = Store::from_parts(store.columns().to_vec(), rows)?;

        self.inner.write(&truncated)
    }
}

/// Operational log whose every append fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingOperationalLog;

impl OperationalLog for FailingOperationalLog {
    fn append(&self, _time: DateTime<Utc>, _message: &str) -> PlaylogResult<()> {
        Err(playlog_error!(
            ErrorKind::LogAppendFailed,
            "Injected operational log failure"
        ))
    }
}
