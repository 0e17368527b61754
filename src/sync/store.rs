//! Persistence seam of the sync engine
//!
//! The engine only needs a narrow slice of the database. Keeping that slice
//! behind a trait lets the engine run against an in-memory store in tests.

use async_trait::async_trait;

use crate::database::DatabaseService;
use crate::models::music::NewMusic;
use crate::models::playlist::{PlaylistBinding, PlaylistHandle};
use crate::utils::errors::TuneCircleError;

#[async_trait]
pub trait SyncStore: Send + Sync {
    /// The group's display name, used as the playlist title
    async fn group_name(&self, group_id: i64) -> Result<Option<String>, TuneCircleError>;

    /// Ids of the group's current members
    async fn member_ids(&self, group_id: i64) -> Result<Vec<i64>, TuneCircleError>;

    /// Group ids the user is a member of
    async fn group_ids_of(&self, user_id: i64) -> Result<Vec<i64>, TuneCircleError>;

    /// Every known user, for the scheduled sweep
    async fn all_user_ids(&self) -> Result<Vec<i64>, TuneCircleError>;

    /// The user's provider token, if they linked an account
    async fn user_token(&self, user_id: i64) -> Result<Option<String>, TuneCircleError>;

    /// Catalog ids of all track-kind entries in the group log
    async fn group_track_catalog_ids(&self, group_id: i64) -> Result<Vec<i64>, TuneCircleError>;

    async fn binding(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<Option<PlaylistBinding>, TuneCircleError>;

    async fn save_binding(
        &self,
        user_id: i64,
        group_id: i64,
        handle: PlaylistHandle,
    ) -> Result<(), TuneCircleError>;

    /// Append a pull-discovered track to the group log
    async fn insert_imported(&self, entry: NewMusic) -> Result<(), TuneCircleError>;
}

#[async_trait]
impl SyncStore for DatabaseService {
    async fn group_name(&self, group_id: i64) -> Result<Option<String>, TuneCircleError> {
        Ok(self.groups.find_by_id(group_id).await?.map(|g| g.name))
    }

    async fn member_ids(&self, group_id: i64) -> Result<Vec<i64>, TuneCircleError> {
        Ok(self
            .groups
            .members(group_id)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect())
    }

    async fn group_ids_of(&self, user_id: i64) -> Result<Vec<i64>, TuneCircleError> {
        Ok(self
            .groups
            .groups_of(user_id)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect())
    }

    async fn all_user_ids(&self) -> Result<Vec<i64>, TuneCircleError> {
        self.users.all_ids().await
    }

    async fn user_token(&self, user_id: i64) -> Result<Option<String>, TuneCircleError> {
        self.users.token(user_id).await
    }

    async fn group_track_catalog_ids(&self, group_id: i64) -> Result<Vec<i64>, TuneCircleError> {
        self.music.group_track_catalog_ids(group_id).await
    }

    async fn binding(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<Option<PlaylistBinding>, TuneCircleError> {
        self.playlists.find(user_id, group_id).await
    }

    async fn save_binding(
        &self,
        user_id: i64,
        group_id: i64,
        handle: PlaylistHandle,
    ) -> Result<(), TuneCircleError> {
        self.playlists.upsert(user_id, group_id, handle).await
    }

    async fn insert_imported(&self, entry: NewMusic) -> Result<(), TuneCircleError> {
        self.share_music(&entry).await?;
        Ok(())
    }
}
