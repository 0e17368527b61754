//! Playlist binding repository implementation

use sqlx::PgPool;

use crate::models::playlist::{PlaylistBinding, PlaylistHandle};
use crate::utils::errors::TuneCircleError;

#[derive(Debug, Clone)]
pub struct PlaylistRepository {
    pool: PgPool,
}

impl PlaylistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<Option<PlaylistBinding>, TuneCircleError> {
        let binding = sqlx::query_as::<_, PlaylistBinding>(
            r#"
            SELECT user_id, group_id, owner_uid, kind
            FROM playlist_bindings
            WHERE user_id = $1 AND group_id = $2
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(binding)
    }

    /// Store the binding, replacing any stale handle for the pair
    pub async fn upsert(
        &self,
        user_id: i64,
        group_id: i64,
        handle: PlaylistHandle,
    ) -> Result<(), TuneCircleError> {
        sqlx::query(
            r#"
            INSERT INTO playlist_bindings (user_id, group_id, owner_uid, kind)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, group_id)
            DO UPDATE SET owner_uid = EXCLUDED.owner_uid, kind = EXCLUDED.kind
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .bind(handle.owner_uid)
        .bind(handle.kind)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete(&self, user_id: i64, group_id: i64) -> Result<(), TuneCircleError> {
        sqlx::query("DELETE FROM playlist_bindings WHERE user_id = $1 AND group_id = $2")
            .bind(user_id)
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
