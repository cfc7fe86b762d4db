use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Locations of the durable files written by a run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    /// Path of the CSV file holding every recorded play.
    pub data_path: PathBuf,
    /// Path of the CSV file holding one outcome line per run.
    pub log_path: PathBuf,
}

impl StoreConfig {
    /// Validates that both paths are set and distinct.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.data_path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyField("store.data_path".to_string()));
        }

        if self.log_path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyField("store.log_path".to_string()));
        }

        if self.data_path == self.log_path {
            return Err(ValidationError::StorePathsCollide);
        }

        Ok(())
    }
}
