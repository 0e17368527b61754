//! Error handling for TuneCircle
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for TuneCircle application
#[derive(Error, Debug)]
pub enum TuneCircleError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Music provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Group not found: {group_id}")]
    GroupNotFound { group_id: i64 },

    #[error("Music entry not found: {music_id}")]
    MusicNotFound { music_id: i64 },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Music provider specific errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider rejected the account token")]
    AuthFailed,

    #[error("Remote resource not found")]
    NotFound,

    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider request timed out")]
    Timeout,
}

/// Result type alias for TuneCircle operations
pub type Result<T> = std::result::Result<T, TuneCircleError>;

/// Result type alias for music provider operations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl TuneCircleError {
    /// Check if the error is recoverable within the current conversation
    pub fn is_recoverable(&self) -> bool {
        match self {
            TuneCircleError::Database(_) => false,
            TuneCircleError::Migration(_) => false,
            TuneCircleError::Config(_) => false,
            TuneCircleError::Serialization(_) => false,
            TuneCircleError::Telegram(_) => true,
            TuneCircleError::Provider(_) => true,
            TuneCircleError::Http(_) => true,
            TuneCircleError::Io(_) => true,
            TuneCircleError::UserNotFound { .. } => true,
            TuneCircleError::GroupNotFound { .. } => true,
            TuneCircleError::MusicNotFound { .. } => true,
            TuneCircleError::InvalidInput(_) => true,
            TuneCircleError::LimitExceeded(_) => true,
            TuneCircleError::UrlParse(_) => false,
        }
    }

    /// Map an error to the message shown to the user at the handler boundary.
    pub fn user_message(&self) -> String {
        match self {
            TuneCircleError::Provider(ProviderError::AuthFailed) => {
                "Your music account token is missing or expired. \
                 Please reconnect your account via the token menu."
                    .to_string()
            }
            TuneCircleError::Provider(_) => {
                "The music service is not responding right now, please try again later.".to_string()
            }
            TuneCircleError::InvalidInput(msg) | TuneCircleError::LimitExceeded(msg) => msg.clone(),
            _ => "Something went wrong :(".to_string(),
        }
    }
}

impl ProviderError {
    /// Whether the remote playlist should be recreated (self-healing path)
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_reconnect_message() {
        let err = TuneCircleError::Provider(ProviderError::AuthFailed);
        assert!(err.user_message().contains("reconnect"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn database_errors_are_fatal_to_the_operation() {
        let err = TuneCircleError::Database(sqlx::Error::RowNotFound);
        assert!(!err.is_recoverable());
        assert_eq!(err.user_message(), "Something went wrong :(");
    }
}
