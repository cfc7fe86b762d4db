use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::error::PlaylogResult;
use crate::oplog::base::{LogEntry, OperationalLog};

/// In-memory [`OperationalLog`]. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryOperationalLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryOperationalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Returns the messages of all entries, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OperationalLog for MemoryOperationalLog {
    fn append(&self, time: DateTime<Utc>, message: &str) -> PlaylogResult<()> {
        self.lock().push(LogEntry {
            time,
            message: message.to_string(),
        });

        Ok(())
    }
}
