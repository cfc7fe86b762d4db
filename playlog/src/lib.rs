//! Incremental sync of recently played tracks into a durable, append-growing store.
//!
//! Each run pulls a bounded window of recent plays from an [`source::EventSource`], projects
//! them with [`normalize::normalize`], merges them into the existing store behind a
//! `played_at` watermark with [`merge::merge`], rewrites the store atomically through an
//! [`store::EventStore`] and records the outcome in an [`oplog::OperationalLog`].
//! [`sync::Syncer`] wires these steps together.

mod macros;

pub mod error;
pub mod merge;
pub mod normalize;
pub mod oplog;
pub mod source;
pub mod store;
pub mod sync;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
