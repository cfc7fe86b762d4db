use playlog::error::{ErrorKind, PlaylogError};
use playlog::playlog_error;
use playlog_config::load_config;
use playlog_config::shared::{SyncerConfig, ValidationError};

use crate::error::{SyncerError, SyncerResult};

/// Loads the syncer configuration without validating it.
///
/// A configuration that cannot be loaded leaves no known log location, so it is the only
/// configuration failure that never reaches the operational log. Validation happens per
/// section in [`crate::core::run_syncer_with_config`].
pub fn load_syncer_config() -> SyncerResult<SyncerConfig> {
    load_config::<SyncerConfig>().map_err(SyncerError::config)
}

/// Converts a validation failure into a run failure of the configuration class.
pub fn invalid_config(err: ValidationError) -> PlaylogError {
    playlog_error!(
        ErrorKind::ConfigError,
        "Invalid configuration",
        err.to_string(),
        source: err
    )
}
