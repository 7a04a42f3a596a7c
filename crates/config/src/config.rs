use serde::{Deserialize, Serialize};

use crate::{
    altda::AltDaConfig, errors::ConfigError, storage::StorageConfig, watcher::WatcherConfig,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub altda: AltDaConfig,
    pub watcher: WatcherConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Parses and validates a TOML config.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config = toml::from_str::<Config>(s)?;
        config.altda.to_params()?;
        Ok(config)
    }
}
