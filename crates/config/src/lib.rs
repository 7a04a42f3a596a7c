//! Configuration for the Alt-DA challenge services, loaded from TOML.

mod altda;
mod config;
mod errors;
mod storage;
mod watcher;

pub use altda::AltDaConfig;
pub use config::Config;
pub use errors::ConfigError;
pub use storage::StorageConfig;
pub use watcher::WatcherConfig;
