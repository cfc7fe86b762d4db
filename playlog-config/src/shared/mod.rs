//! Shared configuration types for playlog services.

mod base;
mod run;
mod source;
mod store;
mod syncer;

pub use base::ValidationError;
pub use run::RunPolicyConfig;
pub use source::{SpotifyConfig, SpotifyConfigWithoutSecrets};
pub use store::StoreConfig;
pub use syncer::{SyncerConfig, SyncerConfigWithoutSecrets};
