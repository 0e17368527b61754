//! Configuration management
//!
//! Settings loading from TOML files and environment variables.

pub mod settings;
pub mod validation;

pub use settings::{
    BotConfig, DatabaseConfig, LimitsConfig, LoggingConfig, ProviderConfig, Settings, SyncConfig,
};
