//! Configuration validation

use crate::config::Settings;
use crate::utils::errors::TuneCircleError;

/// Validate the loaded settings before the application starts
pub fn validate_settings(settings: &Settings) -> Result<(), TuneCircleError> {
    if settings.bot.token.is_empty() {
        return Err(TuneCircleError::Config(
            "Bot token is required (bot.token)".to_string(),
        ));
    }

    if settings.database.url.is_empty() {
        return Err(TuneCircleError::Config(
            "Database URL is required (database.url)".to_string(),
        ));
    }

    if settings.database.max_connections < settings.database.min_connections {
        return Err(TuneCircleError::Config(
            "database.max_connections must be >= database.min_connections".to_string(),
        ));
    }

    url::Url::parse(&settings.provider.api_url)
        .map_err(|e| TuneCircleError::Config(format!("Invalid provider.api_url: {e}")))?;

    if settings.limits.max_group_members < 1 {
        return Err(TuneCircleError::Config(
            "limits.max_group_members must be at least 1".to_string(),
        ));
    }

    if settings.limits.page_size == 0 {
        return Err(TuneCircleError::Config(
            "limits.page_size must be at least 1".to_string(),
        ));
    }

    if settings.sync.enabled && settings.sync.interval_seconds == 0 {
        return Err(TuneCircleError::Config(
            "sync.interval_seconds must be positive when sync is enabled".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "123:test".to_string();
        settings
    }

    #[test]
    fn default_limits_pass_validation() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn empty_bot_token_is_rejected() {
        let settings = Settings::default();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut settings = valid_settings();
        settings.limits.page_size = 0;
        assert!(validate_settings(&settings).is_err());
    }
}
