//! Rating repository implementation

use sqlx::PgPool;

use crate::models::rating::Rating;
use crate::utils::errors::TuneCircleError;

#[derive(Debug, Clone)]
pub struct RatingRepository {
    pool: PgPool,
}

impl RatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(
        &self,
        user_id: i64,
        music_id: i64,
    ) -> Result<Option<Rating>, TuneCircleError> {
        let rating = sqlx::query_as::<_, Rating>(
            "SELECT user_id, music_id, score FROM ratings WHERE user_id = $1 AND music_id = $2",
        )
        .bind(user_id)
        .bind(music_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rating)
    }

    /// Insert or overwrite this rater's score for the entry. Returns true
    /// when the score was newly inserted rather than replaced.
    pub async fn upsert(
        &self,
        user_id: i64,
        music_id: i64,
        score: i32,
    ) -> Result<bool, TuneCircleError> {
        let existed = self.find(user_id, music_id).await?.is_some();

        sqlx::query(
            r#"
            INSERT INTO ratings (user_id, music_id, score)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, music_id) DO UPDATE SET score = EXCLUDED.score
            "#,
        )
        .bind(user_id)
        .bind(music_id)
        .bind(score)
        .execute(&self.pool)
        .await?;

        Ok(!existed)
    }

    /// All scores currently stored for an entry, for the aggregate recompute
    pub async fn scores_for(&self, music_id: i64) -> Result<Vec<i32>, TuneCircleError> {
        let rows: Vec<(i32,)> = sqlx::query_as("SELECT score FROM ratings WHERE music_id = $1")
            .bind(music_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(s,)| s).collect())
    }
}
