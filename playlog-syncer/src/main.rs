//! Playlog syncer binary.
//!
//! Performs a single sync of the recently played window into the configured CSV store and
//! exits. Meant to be started by an external scheduler; runs are assumed to never overlap.

use std::process::ExitCode;

use playlog_config::shared::RunPolicyConfig;
use playlog_telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_syncer_config;
use crate::core::run_syncer_with_config;
use crate::error::SyncerError;

mod config;
mod core;
mod error;
mod spotify;

/// Entry point for the syncer.
///
/// Only a configuration that cannot be loaded at all forces a failure status. Every other
/// failure is recorded in the operational log when possible and exits with a failure status
/// only when `run.exit_on_failure` is set.
fn main() -> ExitCode {
    let config = match load_syncer_config() {
        Ok(config) => config,
        Err(err) => {
            report(&err);
            return ExitCode::FAILURE;
        }
    };

    // The run still records its outcome in the operational log without a subscriber.
    let _log_flusher = match init_tracing(env!("CARGO_BIN_NAME")) {
        Ok(flusher) => Some(flusher),
        Err(err) => {
            report(&SyncerError::config(err));
            None
        }
    };

    let policy = config.run.clone();
    let result = run_syncer_with_config(config);
    if let Err(err) = &result {
        error!("{err}");
        report(err);
    }

    if reports_failure(result.is_err(), &policy) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Returns whether the process exits with a failure status after a loaded configuration.
fn reports_failure(failed: bool, policy: &RunPolicyConfig) -> bool {
    failed && policy.exit_on_failure
}

fn report(err: &SyncerError) {
    eprint!("{}", err.render_report());
}
