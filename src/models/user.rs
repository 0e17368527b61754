//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Telegram user id, used as the primary key
    pub id: i64,
    pub name: String,
    /// Music-service account token, absent until the user links an account
    pub token: Option<String>,
    pub count_of_sharing: i64,
    pub count_of_ratings: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

/// Aggregated account statistics shown in the account view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatistics {
    pub has_token: bool,
    pub count_of_sharing: i64,
    pub count_of_ratings: i64,
    /// Mean of the scores this user has given, if they rated anything
    pub average_score_given: Option<f64>,
    /// Mean of the averages of the music this user shared, over rated entries
    pub average_score_received: Option<f64>,
}
