//! Music repository implementation

use sqlx::PgPool;

use crate::models::music::{Music, NewMusic};
use crate::utils::errors::TuneCircleError;

#[derive(Debug, Clone)]
pub struct MusicRepository {
    pool: PgPool,
}

const MUSIC_COLUMNS: &str = "id, catalog_id, kind, title, comment, cover_uri, average_mark, count_of_ratings, imported, user_id, group_id, created_at";

impl MusicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry to the sharing log
    pub async fn insert(&self, entry: &NewMusic) -> Result<Music, TuneCircleError> {
        let music = sqlx::query_as::<_, Music>(&format!(
            r#"
            INSERT INTO music (catalog_id, kind, title, comment, cover_uri, imported, user_id, group_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MUSIC_COLUMNS}
            "#,
        ))
        .bind(entry.catalog_id)
        .bind(entry.kind.as_str())
        .bind(&entry.title)
        .bind(&entry.comment)
        .bind(&entry.cover_uri)
        .bind(entry.imported)
        .bind(entry.user_id)
        .bind(entry.group_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(music)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Music>, TuneCircleError> {
        let music = sqlx::query_as::<_, Music>(&format!(
            "SELECT {MUSIC_COLUMNS} FROM music WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(music)
    }

    /// A group's full sharing log, oldest first
    pub async fn group_log(&self, group_id: i64) -> Result<Vec<Music>, TuneCircleError> {
        let music = sqlx::query_as::<_, Music>(&format!(
            "SELECT {MUSIC_COLUMNS} FROM music WHERE group_id = $1 ORDER BY id"
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(music)
    }

    /// Everything the user shared, across groups, oldest first
    pub async fn user_log(&self, user_id: i64) -> Result<Vec<Music>, TuneCircleError> {
        let music = sqlx::query_as::<_, Music>(&format!(
            "SELECT {MUSIC_COLUMNS} FROM music WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(music)
    }

    /// Tracks in a group shared by other members, the rate-flow candidates
    pub async fn rateable_tracks(
        &self,
        group_id: i64,
        rater_id: i64,
    ) -> Result<Vec<Music>, TuneCircleError> {
        let music = sqlx::query_as::<_, Music>(&format!(
            r#"
            SELECT {MUSIC_COLUMNS} FROM music
            WHERE group_id = $1 AND user_id <> $2 AND kind = 'track'
            ORDER BY id
            "#,
        ))
        .bind(group_id)
        .bind(rater_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(music)
    }

    /// Catalog ids of all tracks shared into a group, for sync membership
    pub async fn group_track_catalog_ids(
        &self,
        group_id: i64,
    ) -> Result<Vec<i64>, TuneCircleError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT catalog_id FROM music WHERE group_id = $1 AND kind = 'track' ORDER BY id",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Overwrite the cached rating aggregate after a recompute
    pub async fn update_rating_stats(
        &self,
        music_id: i64,
        average_mark: f64,
        count_of_ratings: i64,
    ) -> Result<(), TuneCircleError> {
        sqlx::query("UPDATE music SET average_mark = $2, count_of_ratings = $3 WHERE id = $1")
            .bind(music_id)
            .bind(average_mark)
            .bind(count_of_ratings)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove an entry and its ratings
    pub async fn delete(&self, music_id: i64) -> Result<(), TuneCircleError> {
        sqlx::query("DELETE FROM music WHERE id = $1")
            .bind(music_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
