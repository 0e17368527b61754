//! Playlist binding model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Opaque handle identifying a playlist on the remote music service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistHandle {
    /// Remote account uid owning the playlist
    pub owner_uid: i64,
    /// Remote playlist kind (per-account playlist identifier)
    pub kind: i64,
}

/// Stored mapping from (user, group) to that user's shared playlist for the
/// group. Mutated only when a stale remote playlist has to be recreated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlaylistBinding {
    pub user_id: i64,
    pub group_id: i64,
    pub owner_uid: i64,
    pub kind: i64,
}

impl PlaylistBinding {
    pub fn handle(&self) -> PlaylistHandle {
        PlaylistHandle {
            owner_uid: self.owner_uid,
            kind: self.kind,
        }
    }
}
