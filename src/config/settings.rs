//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub sync: SyncConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Music provider API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub api_url: String,
    pub timeout_seconds: u64,
}

/// Playlist synchronization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Whether the scheduled all-groups sweep runs at all
    pub enabled: bool,
    /// Seconds between scheduled sweeps
    pub interval_seconds: u64,
}

/// Policy constants. These are configuration, not hardcoded invariants.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Maximum number of groups a single creator may own
    pub max_groups_per_user: usize,
    /// Maximum number of members in one group
    pub max_group_members: usize,
    /// Items per page in paginated selections
    pub page_size: usize,
    /// How many recent liked tracks to offer in the share flow
    pub liked_tracks_count: usize,
}

impl LimitsConfig {
    /// Whether a user owning `owned` groups may create another
    pub fn can_create_group(&self, owned: i64) -> bool {
        owned < self.max_groups_per_user as i64
    }

    /// Whether a group with `members` members may take another
    pub fn can_add_member(&self, members: i64) -> bool {
        members < self.max_group_members as i64
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("TUNECIRCLE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::TuneCircleError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/tunecircle".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            provider: ProviderConfig {
                api_url: "https://api.music.yandex.net".to_string(),
                timeout_seconds: 10,
            },
            sync: SyncConfig {
                enabled: true,
                interval_seconds: 3600,
            },
            limits: LimitsConfig {
                max_groups_per_user: 5,
                max_group_members: 6,
                page_size: 5,
                liked_tracks_count: 5,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/tunecircle".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_policy() {
        let limits = Settings::default().limits;
        assert_eq!(limits.max_groups_per_user, 5);
        assert_eq!(limits.max_group_members, 6);
        assert_eq!(limits.page_size, 5);
    }

    #[test]
    fn group_creation_is_capped() {
        let limits = Settings::default().limits;
        assert!(limits.can_create_group(0));
        assert!(limits.can_create_group(4));
        assert!(!limits.can_create_group(5));
        assert!(!limits.can_create_group(17));
    }

    #[test]
    fn member_addition_is_capped() {
        let limits = Settings::default().limits;
        assert!(limits.can_add_member(5));
        assert!(!limits.can_add_member(6));
    }
}
