//! Incremental merge of a normalized batch into the store.
//!
//! The source only exposes a short trailing window, so consecutive windows overlap. The merge
//! closes the overlap with a watermark: the latest `played_at` already stored. Only batch events
//! strictly newer than the watermark are accepted; plays sharing the exact watermark instant are
//! treated as already recorded.

use crate::error::PlaylogResult;
use crate::types::{NormalizedEvent, PlayedAt, Store};

/// Result of merging one batch.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Next store state, computed entirely in memory.
    pub store: Store,
    /// Batch events that were accepted, in the order they were placed in the store.
    pub accepted: Vec<NormalizedEvent>,
    /// Watermark of the existing store, `None` when there was no store or it had no rows.
    pub previous_watermark: Option<PlayedAt>,
    /// Watermark of the merged store.
    pub watermark: Option<PlayedAt>,
}

impl MergeOutcome {
    /// Returns `true` if the merge accepted no event.
    pub fn is_noop(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Merges `batch` into `existing`.
///
/// Without an existing store, or with one that has no rows, every batch event is accepted and
/// rows are ordered by `played_at` descending (stable for equal instants). Otherwise the
/// accepted events keep their batch order and are placed before all existing rows, which are
/// kept unchanged. The resulting schema is the existing schema followed by any new column in
/// order of first appearance.
pub fn merge(existing: Option<Store>, batch: &[NormalizedEvent]) -> PlaylogResult<MergeOutcome> {
    let (existing, previous_watermark) = match existing {
        Some(store) => {
            let watermark = store.watermark()?;
            (Some(store), watermark)
        }
        None => (None, None),
    };

    let accepted: Vec<NormalizedEvent> = match &previous_watermark {
        Some(watermark) => batch
            .iter()
            .filter(|event| event.played_at.is_newer_than(watermark))
            .cloned()
            .collect(),
        None => initial_rows(batch),
    };

    let mut store = match &existing {
        Some(existing) => Store::with_columns(existing.columns().iter().cloned())?,
        None => Store::default(),
    };

    if previous_watermark.is_none() {
        // Column order follows the batch as delivered, rows follow the sorted order.
        for event in batch {
            for column in event.to_record()?.columns() {
                store.ensure_column(column);
            }
        }
    }

    for event in &accepted {
        store.push_record(&event.to_record()?);
    }

    if let Some(existing) = &existing {
        store.extend_from(existing);
    }

    let watermark = accepted
        .iter()
        .map(|event| &event.played_at)
        .chain(previous_watermark.as_ref())
        .max()
        .cloned();

    Ok(MergeOutcome {
        store,
        accepted,
        previous_watermark,
        watermark,
    })
}

fn initial_rows(batch: &[NormalizedEvent]) -> Vec<NormalizedEvent> {
    let mut rows = batch.to_vec();
    rows.sort_by(|a, b| b.played_at.cmp(&a.played_at));
    rows
}
