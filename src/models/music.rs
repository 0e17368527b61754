//! Music model
//!
//! A music entry is one row in a group's append-only sharing log. It is
//! created when a user shares a track or album (or when the sync engine pulls
//! a track from a remote playlist) and afterwards mutated only by rating
//! recomputes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of shared music. Only tracks participate in playlist sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicKind {
    Track,
    Album,
}

impl MusicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MusicKind::Track => "track",
            MusicKind::Album => "album",
        }
    }
}

impl TryFrom<String> for MusicKind {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "track" => Ok(MusicKind::Track),
            "album" => Ok(MusicKind::Album),
            other => Err(format!("unknown music kind: {other}")),
        }
    }
}

impl std::fmt::Display for MusicKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Music {
    pub id: i64,
    /// Id of the track/album in the external music catalog
    pub catalog_id: i64,
    #[sqlx(try_from = "String")]
    pub kind: MusicKind,
    pub title: String,
    /// The sharer's free-text comment
    pub comment: String,
    pub cover_uri: String,
    pub average_mark: f64,
    pub count_of_ratings: i64,
    /// Set on entries discovered by the sync engine's pull phase
    pub imported: bool,
    pub user_id: i64,
    /// May be NULL after the owning group vanished or the sharer left it
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Music {
    /// Expand the stored cover template into a fetchable URL
    pub fn cover_url(&self) -> String {
        format!("https://{}", self.cover_uri.replace("%%", "400x400"))
    }

    pub fn has_cover(&self) -> bool {
        !self.cover_uri.is_empty()
    }
}

/// Fields needed to insert a new music entry
#[derive(Debug, Clone)]
pub struct NewMusic {
    pub catalog_id: i64,
    pub kind: MusicKind,
    pub title: String,
    pub comment: String,
    pub cover_uri: String,
    pub imported: bool,
    pub user_id: i64,
    pub group_id: Option<i64>,
}
