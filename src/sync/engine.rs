//! Playlist reconciliation
//!
//! Keeps each member's remote playlist in step with the group's append-only
//! music log. Two entry points: the on-demand path a user triggers from the
//! group menu (push + pull + propagation) and the scheduled path the sweep
//! uses (push only, silent skip when the user never asked for a playlist).

use std::collections::HashSet;
use std::sync::Arc;

use crate::models::music::{MusicKind, NewMusic};
use crate::models::playlist::PlaylistHandle;
use crate::provider::MusicProvider;
use crate::sync::store::SyncStore;
use crate::utils::errors::{ProviderError, TuneCircleError};

/// What one reconciliation did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Tracks inserted into the remote playlist
    pub pushed: usize,
    /// Tracks discovered remotely and appended to the group log
    pub pulled: usize,
    /// Whether a vanished remote playlist was recreated
    pub recreated: bool,
    /// Scheduled path only: user had no binding or no token, nothing done
    pub skipped: bool,
}

impl SyncOutcome {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Totals of one scheduled sweep
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    pub pairs: usize,
    pub synced: usize,
    pub skipped: usize,
    pub failures: usize,
}

#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn SyncStore>,
    provider: Arc<dyn MusicProvider>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn SyncStore>, provider: Arc<dyn MusicProvider>) -> Self {
        Self { store, provider }
    }

    /// Full reconciliation for the user who pressed the playlist button.
    ///
    /// The user's remote playlist is ground truth for the pull phase: tracks
    /// found there but missing from the group log are appended to the log as
    /// machine-imported entries attributed to this user, then pushed out to
    /// every other bound member.
    pub async fn reconcile_on_demand(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<SyncOutcome, TuneCircleError> {
        let token = self
            .store
            .user_token(user_id)
            .await?
            .ok_or(TuneCircleError::Provider(ProviderError::AuthFailed))?;
        let group_name = self
            .store
            .group_name(group_id)
            .await?
            .ok_or(TuneCircleError::GroupNotFound { group_id })?;

        // Only members may bind a playlist or feed the group log. Callback
        // payloads arrive from the client and cannot be trusted to respect
        // the menus that produced them.
        if !self.store.member_ids(group_id).await?.contains(&user_id) {
            return Err(TuneCircleError::InvalidInput(
                "You are not a member of that group.".to_string(),
            ));
        }

        let handle = match self.store.binding(user_id, group_id).await? {
            Some(binding) => binding.handle(),
            None => {
                let handle = self.provider.create_playlist(&token, &group_name).await?;
                self.store.save_binding(user_id, group_id, handle).await?;
                tracing::info!(user_id, group_id, "created shared playlist");
                handle
            }
        };

        let (handle, recreated) = self
            .resolve_playlist(&token, user_id, group_id, handle, &group_name)
            .await?;

        let pushed = self.push_phase(&token, handle, group_id).await?;
        let pulled = self.pull_phase(&token, user_id, group_id, handle).await?;

        if pulled > 0 {
            self.propagate(group_id, user_id).await;
        }

        tracing::info!(user_id, group_id, pushed, pulled, recreated, "reconciliation finished");
        Ok(SyncOutcome {
            pushed,
            pulled,
            recreated,
            skipped: false,
        })
    }

    /// Push-only reconciliation for the sweep and for propagation. Users who
    /// never created a playlist for the group, or have no token, are skipped
    /// without noise.
    pub async fn reconcile_scheduled(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<SyncOutcome, TuneCircleError> {
        let Some(token) = self.store.user_token(user_id).await? else {
            return Ok(SyncOutcome::skipped());
        };
        let Some(binding) = self.store.binding(user_id, group_id).await? else {
            return Ok(SyncOutcome::skipped());
        };
        let group_name = self
            .store
            .group_name(group_id)
            .await?
            .ok_or(TuneCircleError::GroupNotFound { group_id })?;

        let (handle, recreated) = self
            .resolve_playlist(&token, user_id, group_id, binding.handle(), &group_name)
            .await?;
        let pushed = self.push_phase(&token, handle, group_id).await?;

        Ok(SyncOutcome {
            pushed,
            pulled: 0,
            recreated,
            skipped: false,
        })
    }

    /// Reconcile every (user, group) pair, isolating failures per pair so one
    /// stale token cannot stall anyone else. Failed pairs are retried by the
    /// next sweep, not within this one.
    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        let users = match self.store.all_user_ids().await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "sweep aborted, cannot list users");
                report.failures += 1;
                return report;
            }
        };

        for user_id in users {
            let groups = match self.store.group_ids_of(user_id).await {
                Ok(groups) => groups,
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "sweep cannot list user groups");
                    report.failures += 1;
                    continue;
                }
            };

            for group_id in groups {
                report.pairs += 1;
                match self.reconcile_scheduled(user_id, group_id).await {
                    Ok(outcome) if outcome.skipped => report.skipped += 1,
                    Ok(outcome) => {
                        report.synced += 1;
                        if outcome.pushed > 0 || outcome.recreated {
                            tracing::info!(
                                user_id,
                                group_id,
                                pushed = outcome.pushed,
                                recreated = outcome.recreated,
                                "sweep updated playlist"
                            );
                        }
                    }
                    Err(e) => {
                        report.failures += 1;
                        tracing::warn!(user_id, group_id, error = %e, "sweep pair failed");
                    }
                }
            }
        }

        tracing::info!(
            pairs = report.pairs,
            synced = report.synced,
            skipped = report.skipped,
            failures = report.failures,
            "sweep finished"
        );
        report
    }

    /// Make sure the bound playlist still exists remotely; recreate it under
    /// the group name and rebind when it vanished. The log is never dropped.
    async fn resolve_playlist(
        &self,
        token: &str,
        user_id: i64,
        group_id: i64,
        handle: PlaylistHandle,
        title: &str,
    ) -> Result<(PlaylistHandle, bool), TuneCircleError> {
        match self.provider.get_playlist(token, handle).await {
            Ok(_) => Ok((handle, false)),
            Err(e) if e.is_not_found() => {
                let fresh = self.provider.create_playlist(token, title).await?;
                self.store.save_binding(user_id, group_id, fresh).await?;
                tracing::info!(user_id, group_id, "remote playlist vanished, recreated");
                Ok((fresh, true))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Append remote-only tracks to the group log as imported entries
    async fn pull_phase(
        &self,
        token: &str,
        user_id: i64,
        group_id: i64,
        handle: PlaylistHandle,
    ) -> Result<usize, TuneCircleError> {
        let remote = self.provider.get_playlist(token, handle).await?;
        let known: HashSet<i64> = self
            .store
            .group_track_catalog_ids(group_id)
            .await?
            .into_iter()
            .collect();

        let mut pulled = 0;
        for track_id in remote.track_ids {
            if known.contains(&track_id) {
                continue;
            }
            let info = self.provider.track_info(token, track_id).await?;
            self.store
                .insert_imported(NewMusic {
                    catalog_id: track_id,
                    kind: MusicKind::Track,
                    title: info.display_title(),
                    comment: String::new(),
                    cover_uri: info.cover_uri,
                    imported: true,
                    user_id,
                    group_id: Some(group_id),
                })
                .await?;
            pulled += 1;
            tracing::debug!(user_id, group_id, track_id, "pulled track into group log");
        }

        Ok(pulled)
    }

    /// Insert log tracks missing from the remote playlist. The revision is
    /// re-fetched immediately before every insert so concurrent edits only
    /// cost one rejected request, never a corrupted playlist.
    async fn push_phase(
        &self,
        token: &str,
        handle: PlaylistHandle,
        group_id: i64,
    ) -> Result<usize, TuneCircleError> {
        let remote = self.provider.get_playlist(token, handle).await?;
        let present: HashSet<i64> = remote.track_ids.into_iter().collect();

        let mut seen = HashSet::new();
        let mut pushed = 0;
        for track_id in self.store.group_track_catalog_ids(group_id).await? {
            if present.contains(&track_id) || !seen.insert(track_id) {
                continue;
            }
            let revision = self.provider.get_playlist(token, handle).await?.revision;
            self.provider
                .insert_track(token, handle, track_id, revision)
                .await?;
            pushed += 1;
        }

        Ok(pushed)
    }

    /// Push newly pulled entries out to the other bound members. Best-effort:
    /// a failing member is logged and skipped.
    async fn propagate(&self, group_id: i64, origin_user: i64) {
        let members = match self.store.member_ids(group_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(group_id, error = %e, "cannot list members for propagation");
                return;
            }
        };

        for member_id in members {
            if member_id == origin_user {
                continue;
            }
            match self.reconcile_scheduled(member_id, group_id).await {
                Ok(outcome) if outcome.skipped => {}
                Ok(outcome) => {
                    tracing::debug!(
                        user_id = member_id,
                        group_id,
                        pushed = outcome.pushed,
                        "propagated pulled tracks"
                    );
                }
                Err(e) => {
                    tracing::warn!(user_id = member_id, group_id, error = %e, "propagation failed for member");
                }
            }
        }
    }
}
