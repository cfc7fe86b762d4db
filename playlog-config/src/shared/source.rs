use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Spotify Web API credentials and fetch window settings.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Clone, Debug, Deserialize)]
pub struct SpotifyConfig {
    /// OAuth client identifier of the registered Spotify application.
    pub client_id: String,
    /// OAuth client secret of the registered Spotify application.
    pub client_secret: SecretString,
    /// Long-lived refresh token granted with the `user-read-recently-played` scope.
    pub refresh_token: SecretString,
    /// Number of most recent plays requested per run.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    /// Base URL of the accounts service used for token exchange.
    #[serde(default = "default_accounts_url")]
    pub accounts_url: String,
    /// Base URL of the Web API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl SpotifyConfig {
    /// Default number of plays requested per run.
    pub const DEFAULT_FETCH_LIMIT: usize = 50;

    /// Largest window the recently-played endpoint serves.
    pub const MAX_FETCH_LIMIT: usize = 50;

    /// Validates credentials presence and the fetch window size.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.client_id.trim().is_empty() {
            return Err(ValidationError::EmptyField("source.client_id".to_string()));
        }

        if self.fetch_limit == 0 || self.fetch_limit > Self::MAX_FETCH_LIMIT {
            return Err(ValidationError::InvalidFieldValue {
                field: "source.fetch_limit".to_string(),
                constraint: format!("must be between 1 and {}", Self::MAX_FETCH_LIMIT),
            });
        }

        Ok(())
    }
}

/// Same as [`SpotifyConfig`] but without secrets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpotifyConfigWithoutSecrets {
    pub client_id: String,
    pub fetch_limit: usize,
    pub accounts_url: String,
    pub api_url: String,
}

impl From<SpotifyConfig> for SpotifyConfigWithoutSecrets {
    fn from(value: SpotifyConfig) -> Self {
        SpotifyConfigWithoutSecrets {
            client_id: value.client_id,
            fetch_limit: value.fetch_limit,
            accounts_url: value.accounts_url,
            api_url: value.api_url,
        }
    }
}

fn default_fetch_limit() -> usize {
    SpotifyConfig::DEFAULT_FETCH_LIMIT
}

fn default_accounts_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_api_url() -> String {
    "https://api.spotify.com".to_string()
}
