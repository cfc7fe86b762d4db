use chrono::{DateTime, Utc};

use crate::error::PlaylogResult;

/// Append-only record of run outcomes.
///
/// One entry is appended per run, after the merge attempt. Entries are never rewritten or
/// deduplicated.
pub trait OperationalLog {
    /// Appends one `(time, message)` entry.
    fn append(&self, time: DateTime<Utc>, message: &str) -> PlaylogResult<()>;
}

/// An entry of an [`OperationalLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub message: String,
}
