//! Config loading and persistence.

mod load;
mod merge;
mod schema;

use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};

pub use load::{
    WORKSPACE_CONFIG_FILE, config_path, load, load_for_workspace, load_user_config,
    load_workspace_config, workspace_config_path, write_config,
};
pub use merge::{apply_env_overrides, apply_overrides_from, merge_layers};
pub use schema::{
    CacheConfig, Config, ConfigLayer, DEFAULT_DEBOUNCE_MS, DEFAULT_PRESENCE_SCOPE,
    FileLoggingConfig, FileLoggingConfigOverride, LogFormat, LogRotation, LoggingConfig,
    LoggingConfigOverride, MIN_HEARTBEAT_MS, PresenceConfig, PresenceOverride, SyncConfig, SyncOverride,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("failed to render config: {reason}")]
    Render { reason: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn transience(&self) -> Transience {
        match self {
            ConfigError::Read { .. } | ConfigError::Write { .. } => Transience::Unknown,
            ConfigError::Parse { .. } | ConfigError::Render { .. } => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            ConfigError::Write { .. } => Effect::Unknown,
            _ => Effect::None,
        }
    }
}
