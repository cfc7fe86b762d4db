use crate::error::PlaylogResult;
use crate::types::RawEvent;

/// Supplier of the bounded window of recent raw events.
///
/// The source keeps no cursor. Every call returns up to `limit` of the most recent events in no
/// guaranteed order, so consecutive windows may overlap or leave gaps.
pub trait EventSource {
    /// Fetches up to `limit` of the most recent raw events.
    fn fetch_recent(&self, limit: usize) -> PlaylogResult<Vec<RawEvent>>;
}
