use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{
    RunPolicyConfig, SpotifyConfig, SpotifyConfigWithoutSecrets, StoreConfig, ValidationError,
};

/// Complete configuration for the syncer process.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncerConfig {
    /// Source of the recently played window.
    pub source: SpotifyConfig,
    /// Durable file locations.
    pub store: StoreConfig,
    /// Outcome reporting policy.
    #[serde(default)]
    pub run: RunPolicyConfig,
}

impl SyncerConfig {
    /// Validates the complete syncer configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source.validate()?;
        self.store.validate()
    }
}

impl Config for SyncerConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

/// Same as [`SyncerConfig`] but without secrets, safe to serialize and log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncerConfigWithoutSecrets {
    pub source: SpotifyConfigWithoutSecrets,
    pub store: StoreConfig,
    pub run: RunPolicyConfig,
}

impl From<SyncerConfig> for SyncerConfigWithoutSecrets {
    fn from(value: SyncerConfig) -> Self {
        SyncerConfigWithoutSecrets {
            source: value.source.into(),
            store: value.store,
            run: value.run,
        }
    }
}
