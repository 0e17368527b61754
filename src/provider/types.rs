//! Music provider data types
//!
//! Plain data carried between the provider client, the handlers and the sync
//! engine, plus the serde shapes of the remote API responses.

use serde::{Deserialize, Serialize};

/// A track as the catalog describes it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: i64,
    pub title: String,
    pub artists: Vec<String>,
    /// Cover template with a `%%` size placeholder, no scheme
    pub cover_uri: String,
}

/// An album as the catalog describes it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumInfo {
    pub id: i64,
    pub title: String,
    pub artists: Vec<String>,
    pub cover_uri: String,
}

impl TrackInfo {
    pub fn display_title(&self) -> String {
        format_title(&self.artists, &self.title)
    }

    pub fn cover_url(&self) -> String {
        cover_url(&self.cover_uri)
    }
}

impl AlbumInfo {
    pub fn display_title(&self) -> String {
        format_title(&self.artists, &self.title)
    }

    pub fn cover_url(&self) -> String {
        cover_url(&self.cover_uri)
    }
}

/// Snapshot of a remote playlist: its optimistic-concurrency revision and the
/// catalog ids of its tracks in playlist order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePlaylist {
    pub revision: i64,
    pub track_ids: Vec<i64>,
}

fn format_title(artists: &[String], title: &str) -> String {
    if artists.is_empty() {
        title.to_string()
    } else {
        format!("{} - {}", artists.join(", "), title)
    }
}

/// Expand the catalog's cover template into a fetchable URL
fn cover_url(cover_uri: &str) -> String {
    format!("https://{}", cover_uri.replace("%%", "400x400"))
}

// Wire shapes. The API wraps every payload in a `result` envelope.

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountStatus {
    pub account: AccountInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountInfo {
    pub uid: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiTrack {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    #[serde(default)]
    pub cover_uri: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAlbum {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    #[serde(default)]
    pub cover_uri: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResult {
    #[serde(default)]
    pub tracks: Option<SearchPage<ApiTrack>>,
    #[serde(default)]
    pub albums: Option<SearchPage<ApiAlbum>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikedTrackRef {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikedTracks {
    #[serde(default = "Vec::new")]
    pub tracks: Vec<LikedTrackRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPlaylistTrack {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPlaylist {
    pub kind: i64,
    pub revision: i64,
    #[serde(default = "Vec::new")]
    pub tracks: Vec<ApiPlaylistTrack>,
    pub owner: ApiPlaylistOwner,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPlaylistOwner {
    pub uid: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiRevision {
    pub revision: i64,
}

impl From<ApiTrack> for TrackInfo {
    fn from(t: ApiTrack) -> Self {
        TrackInfo {
            id: t.id,
            title: t.title,
            artists: t.artists.into_iter().map(|a| a.name).collect(),
            cover_uri: t.cover_uri,
        }
    }
}

impl From<ApiAlbum> for AlbumInfo {
    fn from(a: ApiAlbum) -> Self {
        AlbumInfo {
            id: a.id,
            title: a.title,
            artists: a.artists.into_iter().map(|a| a.name).collect(),
            cover_uri: a.cover_uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_title_joins_artists() {
        let track = TrackInfo {
            id: 1,
            title: "Sing Sing Sing".to_string(),
            artists: vec!["Benny Goodman".to_string(), "Gene Krupa".to_string()],
            cover_uri: String::new(),
        };
        assert_eq!(
            track.display_title(),
            "Benny Goodman, Gene Krupa - Sing Sing Sing"
        );
    }

    #[test]
    fn cover_template_expands_to_url() {
        let album = AlbumInfo {
            id: 2,
            title: "Swing".to_string(),
            artists: vec![],
            cover_uri: "img.example/covers/2/%%".to_string(),
        };
        assert_eq!(album.cover_url(), "https://img.example/covers/2/400x400");
        assert_eq!(album.display_title(), "Swing");
    }
}
