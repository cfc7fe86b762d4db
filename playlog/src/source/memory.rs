use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::PlaylogResult;
use crate::source::base::EventSource;
use crate::types::RawEvent;

/// In-memory [`EventSource`] serving a replaceable window of events.
///
/// The window is served in the order it was set. Clones share the same window.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource {
    window: Arc<Mutex<Vec<RawEvent>>>,
}

impl MemoryEventSource {
    pub fn new(window: Vec<RawEvent>) -> Self {
        Self {
            window: Arc::new(Mutex::new(window)),
        }
    }

    /// Replaces the window served by later fetches.
    pub fn set_window(&self, window: Vec<RawEvent>) {
        *self.lock() = window;
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RawEvent>> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSource for MemoryEventSource {
    fn fetch_recent(&self, limit: usize) -> PlaylogResult<Vec<RawEvent>> {
        Ok(self.lock().iter().take(limit).cloned().collect())
    }
}
