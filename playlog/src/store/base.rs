use crate::error::PlaylogResult;
use crate::types::Store;

/// Durable home of the merged play history.
///
/// [`EventStore`] implementations decide where the store lives. A read of a store that was
/// never written returns `None`; a store that exists but cannot be decoded is an error and must
/// never be reported as absent, otherwise the next write would replace the history.
pub trait EventStore {
    /// Reads the whole store.
    fn read(&self) -> PlaylogResult<Option<Store>>;

    /// Replaces the whole store.
    ///
    /// The replacement must be atomic: after a failed write the previous store is still intact.
    fn write(&self, store: &Store) -> PlaylogResult<()>;
}
