//! Database service layer
//!
//! High-level operations over the repositories. Handlers and the sync engine
//! go through this facade instead of touching repositories directly, so the
//! policy checks (group caps, counter upkeep, rating recomputes) live in one
//! place. The policy operations run against the narrow [`SocialStore`] slice,
//! which lets them be exercised against an in-memory double.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::config::LimitsConfig;
use crate::database::repositories::{
    GroupRepository, MusicRepository, PlaylistRepository, RatingRepository, UserRepository,
};
use crate::models::group::Group;
use crate::models::music::{Music, NewMusic};
use crate::models::rating::rating_stats;
use crate::models::user::{User, UserStatistics};
use crate::utils::errors::TuneCircleError;

/// The slice of the store the policy operations need
#[async_trait]
pub trait SocialStore: Send + Sync {
    async fn groups_created_by(&self, creator_id: i64) -> Result<i64, TuneCircleError>;

    async fn insert_group(&self, name: &str, creator_id: i64) -> Result<Group, TuneCircleError>;

    async fn group_member_count(&self, group_id: i64) -> Result<i64, TuneCircleError>;

    async fn has_member(&self, group_id: i64, user_id: i64) -> Result<bool, TuneCircleError>;

    async fn insert_member(&self, group_id: i64, user_id: i64) -> Result<(), TuneCircleError>;

    async fn music_by_id(&self, music_id: i64) -> Result<Option<Music>, TuneCircleError>;

    /// Store the score, replacing any earlier one by the same rater.
    /// Returns whether this was the rater's first score for the entry.
    async fn upsert_score(
        &self,
        user_id: i64,
        music_id: i64,
        score: i32,
    ) -> Result<bool, TuneCircleError>;

    /// All live scores for the entry, one per rater
    async fn scores_of(&self, music_id: i64) -> Result<Vec<i32>, TuneCircleError>;

    async fn store_rating_stats(
        &self,
        music_id: i64,
        average: f64,
        count: i64,
    ) -> Result<(), TuneCircleError>;

    async fn bump_rating_counter(&self, user_id: i64) -> Result<(), TuneCircleError>;
}

/// Create a group with the caller as creator and first member.
/// Rejected before any write once the caller owns the maximum number of groups.
pub async fn create_group_checked(
    store: &dyn SocialStore,
    limits: &LimitsConfig,
    creator_id: i64,
    name: &str,
) -> Result<Group, TuneCircleError> {
    let created = store.groups_created_by(creator_id).await?;
    if !limits.can_create_group(created) {
        return Err(TuneCircleError::LimitExceeded(format!(
            "you already created {} groups, that is the maximum",
            limits.max_groups_per_user
        )));
    }

    let group = store.insert_group(name, creator_id).await?;
    tracing::info!(group_id = group.id, creator_id, "group created");
    Ok(group)
}

/// Enroll a user into a group, enforcing the member cap before any write
pub async fn add_member_checked(
    store: &dyn SocialStore,
    limits: &LimitsConfig,
    group_id: i64,
    user_id: i64,
) -> Result<(), TuneCircleError> {
    if store.has_member(group_id, user_id).await? {
        return Ok(());
    }

    let members = store.group_member_count(group_id).await?;
    if !limits.can_add_member(members) {
        return Err(TuneCircleError::LimitExceeded(format!(
            "the group is full, it holds at most {} members",
            limits.max_group_members
        )));
    }

    store.insert_member(group_id, user_id).await?;
    tracing::info!(group_id, user_id, "member added to group");
    Ok(())
}

/// Record a rating and recompute the entry's aggregate from all live
/// scores. Re-rating replaces the old score, the rater's lifetime counter
/// only moves on a first-time rating.
pub async fn apply_rating(
    store: &dyn SocialStore,
    user_id: i64,
    music_id: i64,
    score: i32,
) -> Result<Music, TuneCircleError> {
    if !(0..=5).contains(&score) {
        return Err(TuneCircleError::InvalidInput(format!(
            "score {score} is out of the 0..=5 range"
        )));
    }

    store
        .music_by_id(music_id)
        .await?
        .ok_or(TuneCircleError::MusicNotFound { music_id })?;

    let inserted = store.upsert_score(user_id, music_id, score).await?;

    let scores = store.scores_of(music_id).await?;
    let (average, count) = rating_stats(&scores);
    store.store_rating_stats(music_id, average, count).await?;

    if inserted {
        store.bump_rating_counter(user_id).await?;
    }

    store
        .music_by_id(music_id)
        .await?
        .ok_or(TuneCircleError::MusicNotFound { music_id })
}

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub groups: GroupRepository,
    pub music: MusicRepository,
    pub ratings: RatingRepository,
    pub playlists: PlaylistRepository,
    limits: LimitsConfig,
}

impl DatabaseService {
    pub fn new(pool: PgPool, limits: LimitsConfig) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            groups: GroupRepository::new(pool.clone()),
            music: MusicRepository::new(pool.clone()),
            ratings: RatingRepository::new(pool.clone()),
            playlists: PlaylistRepository::new(pool),
            limits,
        }
    }

    /// Register the user on first contact, or refresh nothing if known
    pub async fn register_user(&self, id: i64, name: &str) -> Result<User, TuneCircleError> {
        let user = self.users.ensure_exists(id, name).await?;
        tracing::debug!(user_id = id, "user registered or already known");
        Ok(user)
    }

    pub async fn create_group(
        &self,
        creator_id: i64,
        name: &str,
    ) -> Result<Group, TuneCircleError> {
        create_group_checked(self, &self.limits, creator_id, name).await
    }

    pub async fn add_member(&self, group_id: i64, user_id: i64) -> Result<(), TuneCircleError> {
        add_member_checked(self, &self.limits, group_id, user_id).await
    }

    /// Drop a group if the caller created it, otherwise leave it.
    /// Either way the caller's playlist binding for the group goes away;
    /// shared music stays in the log with its group reference cleared
    /// where the group itself vanished.
    pub async fn leave_or_delete_group(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<(), TuneCircleError> {
        let group = self
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or(TuneCircleError::GroupNotFound { group_id })?;

        if group.is_creator(user_id) {
            self.groups.delete(group_id).await?;
            tracing::info!(group_id, user_id, "group deleted by creator");
        } else {
            self.playlists.delete(user_id, group_id).await?;
            self.groups.remove_member(group_id, user_id).await?;
            tracing::info!(group_id, user_id, "member left group");
        }

        Ok(())
    }

    /// Append a shared track or album to the group log and bump the
    /// sharer's counter. Entries discovered by the sync pull skip the
    /// counter, they were not shared through the bot.
    pub async fn share_music(&self, entry: &NewMusic) -> Result<Music, TuneCircleError> {
        let music = self.music.insert(entry).await?;
        if !entry.imported {
            self.users.increment_sharing(entry.user_id).await?;
        }

        tracing::info!(
            music_id = music.id,
            user_id = entry.user_id,
            kind = %entry.kind,
            "music entry recorded"
        );
        Ok(music)
    }

    pub async fn record_rating(
        &self,
        user_id: i64,
        music_id: i64,
        score: i32,
    ) -> Result<Music, TuneCircleError> {
        apply_rating(self, user_id, music_id, score).await
    }

    pub async fn user_statistics(&self, user_id: i64) -> Result<UserStatistics, TuneCircleError> {
        self.users.statistics(user_id).await
    }
}

#[async_trait]
impl SocialStore for DatabaseService {
    async fn groups_created_by(&self, creator_id: i64) -> Result<i64, TuneCircleError> {
        self.groups.count_created_by(creator_id).await
    }

    async fn insert_group(&self, name: &str, creator_id: i64) -> Result<Group, TuneCircleError> {
        self.groups.create(name, creator_id).await
    }

    async fn group_member_count(&self, group_id: i64) -> Result<i64, TuneCircleError> {
        self.groups.member_count(group_id).await
    }

    async fn has_member(&self, group_id: i64, user_id: i64) -> Result<bool, TuneCircleError> {
        self.groups.is_member(group_id, user_id).await
    }

    async fn insert_member(&self, group_id: i64, user_id: i64) -> Result<(), TuneCircleError> {
        self.groups.add_member(group_id, user_id).await
    }

    async fn music_by_id(&self, music_id: i64) -> Result<Option<Music>, TuneCircleError> {
        self.music.find_by_id(music_id).await
    }

    async fn upsert_score(
        &self,
        user_id: i64,
        music_id: i64,
        score: i32,
    ) -> Result<bool, TuneCircleError> {
        self.ratings.upsert(user_id, music_id, score).await
    }

    async fn scores_of(&self, music_id: i64) -> Result<Vec<i32>, TuneCircleError> {
        self.ratings.scores_for(music_id).await
    }

    async fn store_rating_stats(
        &self,
        music_id: i64,
        average: f64,
        count: i64,
    ) -> Result<(), TuneCircleError> {
        self.music.update_rating_stats(music_id, average, count).await
    }

    async fn bump_rating_counter(&self, user_id: i64) -> Result<(), TuneCircleError> {
        self.users.increment_ratings(user_id).await
    }
}
