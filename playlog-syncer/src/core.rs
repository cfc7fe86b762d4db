use playlog::oplog::csv_file::CsvOperationalLog;
use playlog::store::csv_file::CsvEventStore;
use playlog::sync::{SyncOptions, SyncSummary, Syncer, record_outcome};
use playlog_config::shared::{SyncerConfig, SyncerConfigWithoutSecrets};
use tracing::{debug, info};

use crate::config::invalid_config;
use crate::error::{SyncerError, SyncerResult};
use crate::spotify::SpotifyEventSource;

/// Performs one sync run with the provided configuration.
///
/// Builds the Spotify source and the CSV-backed store and operational log, then runs the
/// fetch, merge and persist cycle once. Once the store locations are valid, the outcome is
/// always appended to the operational log before this returns, including an invalid source
/// configuration.
pub fn run_syncer_with_config(config: SyncerConfig) -> SyncerResult<SyncSummary> {
    info!("starting syncer");

    log_config(&config);

    // Without valid store locations there is nowhere safe to record the failure.
    config.store.validate().map_err(SyncerError::config)?;
    let log = CsvOperationalLog::new(&config.store.log_path);

    if let Err(err) = config.source.validate() {
        return record_outcome(
            &log,
            Err(invalid_config(err)),
            config.run.escalate_log_failures,
        )
        .map_err(SyncerError::from);
    }

    let source = SpotifyEventSource::new(&config.source);
    let store = CsvEventStore::new(&config.store.data_path);

    let syncer = Syncer::new(source, store, log, sync_options(&config));
    let summary = syncer.run()?;

    info!(
        rows = summary.total_rows,
        accepted = summary.accepted,
        "syncer finished"
    );

    Ok(summary)
}

fn sync_options(config: &SyncerConfig) -> SyncOptions {
    SyncOptions {
        fetch_limit: config.source.fetch_limit,
        escalate_log_failures: config.run.escalate_log_failures,
        verify_write: config.run.verify_write,
    }
}

fn log_config(config: &SyncerConfig) {
    let config = SyncerConfigWithoutSecrets::from(config.clone());
    debug!(
        client_id = %config.source.client_id,
        fetch_limit = config.source.fetch_limit,
        api_url = %config.source.api_url,
        "using spotify source config"
    );
    debug!(
        data_path = %config.store.data_path.display(),
        log_path = %config.store.log_path.display(),
        "using csv store config"
    );
    debug!(
        exit_on_failure = config.run.exit_on_failure,
        escalate_log_failures = config.run.escalate_log_failures,
        verify_write = config.run.verify_write,
        "using run policy config"
    );
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use playlog::error::ErrorClass;
    use tempfile::TempDir;

    use super::*;

    fn config(fetch_limit: usize, data_path: &Path, log_path: &Path) -> SyncerConfig {
        serde_json::from_value(serde_json::json!({
            "source": {
                "client_id": "client",
                "client_secret": "secret",
                "refresh_token": "refresh",
                "fetch_limit": fetch_limit
            },
            "store": {"data_path": data_path, "log_path": log_path},
            "run": {"escalate_log_failures": true, "verify_write": false}
        }))
        .unwrap()
    }

    #[test]
    fn sync_options_follow_the_configuration() {
        let config = config(20, Path::new("dat.csv"), Path::new("log.csv"));

        let options = sync_options(&config);

        assert_eq!(options.fetch_limit, 20);
        assert!(options.escalate_log_failures);
        assert!(!options.verify_write);
    }

    #[test]
    fn invalid_source_config_is_recorded_in_the_operational_log() {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("dat.csv");
        let log_path = dir.path().join("log.csv");

        let err = run_syncer_with_config(config(51, &data_path, &log_path)).unwrap_err();

        assert!(matches!(&err, SyncerError::Playlog(err) if err.class() == ErrorClass::Config));
        assert_eq!(err.category(), "configuration error");
        assert!(!data_path.exists());
        let log = fs::read_to_string(&log_path).unwrap();
        let entry = log.lines().nth(1).unwrap();
        assert!(entry.contains("ERROR: configuration error: Invalid configuration"));
        assert!(entry.contains("must be between 1 and 50"));
    }

    #[test]
    fn colliding_store_paths_are_not_logged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dat.csv");

        let err = run_syncer_with_config(config(50, &path, &path)).unwrap_err();

        assert!(matches!(err, SyncerError::Config(_, _)));
        assert!(!path.exists());
    }
}
