//! Run orchestration: fetch, normalize, merge, persist, then record the outcome.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::error::{ErrorKind, PlaylogError, PlaylogResult};
use crate::merge::merge;
use crate::normalize::normalize;
use crate::oplog::OperationalLog;
use crate::playlog_error;
use crate::source::EventSource;
use crate::store::EventStore;
use crate::types::PlayedAt;

/// Default number of events requested per run.
pub const DEFAULT_FETCH_LIMIT: usize = 50;

/// Behaviour of a [`Syncer`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Maximum number of events requested from the source.
    pub fetch_limit: usize,
    /// Turns operational log failures into run failures.
    pub escalate_log_failures: bool,
    /// Re-reads the store after writing and compares row counts.
    pub verify_write: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            fetch_limit: DEFAULT_FETCH_LIMIT,
            escalate_log_failures: false,
            verify_write: true,
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct SyncSummary {
    /// Raw events returned by the source.
    pub fetched: usize,
    /// Events accepted by the merge.
    pub accepted: usize,
    /// Rows in the store after the run.
    pub total_rows: usize,
    /// Watermark before the merge.
    pub previous_watermark: Option<PlayedAt>,
    /// Watermark after the merge.
    pub watermark: Option<PlayedAt>,
}

impl SyncSummary {
    /// Message recorded in the operational log for this run.
    pub fn log_message(&self) -> String {
        format!("SUCCESS: {} rows", self.total_rows)
    }
}

/// Message recorded in the operational log for a failed run.
pub fn failure_message(error: &PlaylogError) -> String {
    format!("ERROR: {}", error.summary())
}

/// Appends the outcome of a run to `log` and returns it.
///
/// A failed append is reported through tracing and only changes the result when
/// `escalate_log_failures` is set; if the run had failed too, both errors are returned together.
pub fn record_outcome<L>(
    log: &L,
    result: PlaylogResult<SyncSummary>,
    escalate_log_failures: bool,
) -> PlaylogResult<SyncSummary>
where
    L: OperationalLog,
{
    let message = match &result {
        Ok(summary) => summary.log_message(),
        Err(err) => {
            error!(class = %err.class(), error = %err, "sync run failed");
            failure_message(err)
        }
    };

    let Err(log_error) = log.append(Utc::now(), &message) else {
        return result;
    };

    error!(error = %log_error, "failed to append to the operational log");
    if !escalate_log_failures {
        return result;
    }

    match result {
        Ok(_) => Err(log_error),
        Err(run_error) => Err(vec![run_error, log_error].into()),
    }
}

/// Wires an [`EventSource`], an [`EventStore`] and an [`OperationalLog`] into one run.
#[derive(Debug)]
pub struct Syncer<S, T, L> {
    source: S,
    store: T,
    log: L,
    options: SyncOptions,
}

impl<S, T, L> Syncer<S, T, L>
where
    S: EventSource,
    T: EventStore,
    L: OperationalLog,
{
    pub fn new(source: S, store: T, log: L, options: SyncOptions) -> Self {
        Self {
            source,
            store,
            log,
            options,
        }
    }

    /// Performs one run and appends its outcome to the operational log.
    ///
    /// A failed run leaves the store untouched. See [`record_outcome`] for how a failed log
    /// append is handled.
    pub fn run(&self) -> PlaylogResult<SyncSummary> {
        info!(limit = self.options.fetch_limit, "starting sync run");

        let result = self.sync();
        record_outcome(&self.log, result, self.options.escalate_log_failures)
    }

    fn sync(&self) -> PlaylogResult<SyncSummary> {
        let raw_events = self.source.fetch_recent(self.options.fetch_limit)?;
        info!(fetched = raw_events.len(), "fetched recent events");

        let batch = normalize(&raw_events)?;
        let existing = self.store.read()?;
        let outcome = merge(existing, &batch)?;

        match &outcome.previous_watermark {
            Some(watermark) => {
                info!(%watermark, accepted = outcome.accepted.len(), "merged batch");
            }
            None => info!(accepted = outcome.accepted.len(), "initialized store"),
        }
        if outcome.is_noop() && !batch.is_empty() {
            debug!("every fetched event is at or below the watermark");
        }
        for event in &outcome.accepted {
            debug!(name = event.display_name(), played_at = %event.played_at, "new play");
        }

        self.store.write(&outcome.store)?;

        let total_rows = if self.options.verify_write {
            self.verify_write(outcome.store.len())?
        } else {
            outcome.store.len()
        };

        let summary = SyncSummary {
            fetched: raw_events.len(),
            accepted: outcome.accepted.len(),
            total_rows,
            previous_watermark: outcome.previous_watermark,
            watermark: outcome.watermark,
        };

        info!(
            fetched = summary.fetched,
            accepted = summary.accepted,
            rows = summary.total_rows,
            "sync run completed"
        );

        Ok(summary)
    }

    /// Reads the store back and returns its row count.
    fn verify_write(&self, expected_rows: usize) -> PlaylogResult<usize> {
        let read_back = self.store.read().map_err(|err| {
            playlog_error!(
                ErrorKind::StoreVerificationFailed,
                "Written store could not be read back",
                err.summary(),
                source: err
            )
        })?;

        let Some(read_back) = read_back else {
            return Err(playlog_error!(
                ErrorKind::StoreVerificationFailed,
                "Written store is missing"
            ));
        };

        if read_back.len() != expected_rows {
            warn!(
                expected = expected_rows,
                actual = read_back.len(),
                "store row count differs after write"
            );
            return Err(playlog_error!(
                ErrorKind::StoreVerificationFailed,
                "Written store has an unexpected row count",
                format!("expected {expected_rows} rows, read back {}", read_back.len())
            ));
        }

        Ok(read_back.len())
    }
}
