//! User repository implementation

use sqlx::PgPool;

use crate::models::user::{User, UserStatistics};
use crate::utils::errors::TuneCircleError;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user on first contact. Idempotent: an existing row is
    /// returned untouched, counters and token included.
    pub async fn ensure_exists(&self, id: i64, name: &str) -> Result<User, TuneCircleError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or(TuneCircleError::UserNotFound { user_id: id })
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, TuneCircleError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, token, count_of_sharing, count_of_ratings, created_at FROM users WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Exact, case-sensitive display-name lookup
    pub async fn find_by_name(&self, name: &str) -> Result<Option<User>, TuneCircleError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, token, count_of_sharing, count_of_ratings, created_at FROM users WHERE name = $1"
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Replace the user's music-service token
    pub async fn update_token(&self, id: i64, token: &str) -> Result<(), TuneCircleError> {
        sqlx::query("UPDATE users SET token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Get the stored token, if any
    pub async fn token(&self, id: i64) -> Result<Option<String>, TuneCircleError> {
        let token: Option<(Option<String>,)> =
            sqlx::query_as("SELECT token FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(token.and_then(|(t,)| t))
    }

    /// Increment the lifetime sharing counter
    pub async fn increment_sharing(&self, id: i64) -> Result<(), TuneCircleError> {
        sqlx::query("UPDATE users SET count_of_sharing = count_of_sharing + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Increment the lifetime rating counter
    pub async fn increment_ratings(&self, id: i64) -> Result<(), TuneCircleError> {
        sqlx::query("UPDATE users SET count_of_ratings = count_of_ratings + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List all user ids, for the scheduled sweep
    pub async fn all_ids(&self) -> Result<Vec<i64>, TuneCircleError> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT id FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Aggregate the account statistics shown in the account view
    pub async fn statistics(&self, id: i64) -> Result<UserStatistics, TuneCircleError> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or(TuneCircleError::UserNotFound { user_id: id })?;

        let given: (Option<f64>,) =
            sqlx::query_as("SELECT AVG(score::float8) FROM ratings WHERE user_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        let received: (Option<f64>,) = sqlx::query_as(
            "SELECT AVG(average_mark) FROM music WHERE user_id = $1 AND count_of_ratings > 0",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserStatistics {
            has_token: user.has_token(),
            count_of_sharing: user.count_of_sharing,
            count_of_ratings: user.count_of_ratings,
            average_score_given: given.0,
            average_score_received: received.0,
        })
    }
}
