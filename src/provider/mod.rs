//! Music provider integration
//!
//! Everything the bot asks the external music service for goes through the
//! [`MusicProvider`] trait. The production implementation is an HTTP client;
//! tests substitute an in-memory fake.

pub mod client;
pub mod types;

pub use client::HttpMusicProvider;
pub use types::{AlbumInfo, RemotePlaylist, TrackInfo};

use async_trait::async_trait;

use crate::models::playlist::PlaylistHandle;
use crate::utils::errors::ProviderResult;

/// Operations the bot needs from the music service. Every call carries the
/// acting user's account token.
#[async_trait]
pub trait MusicProvider: Send + Sync {
    /// Validate a token and return the remote account uid it belongs to
    async fn resolve(&self, token: &str) -> ProviderResult<i64>;

    /// The user's most recently liked tracks, newest first, at most `count`
    async fn liked_tracks(&self, token: &str, count: usize) -> ProviderResult<Vec<TrackInfo>>;

    async fn search_tracks(&self, token: &str, query: &str) -> ProviderResult<Vec<TrackInfo>>;

    async fn search_albums(&self, token: &str, query: &str) -> ProviderResult<Vec<AlbumInfo>>;

    async fn track_info(&self, token: &str, track_id: i64) -> ProviderResult<TrackInfo>;

    async fn album_info(&self, token: &str, album_id: i64) -> ProviderResult<AlbumInfo>;

    /// Fetch a playlist's current tracks and revision
    async fn get_playlist(&self, token: &str, handle: PlaylistHandle)
        -> ProviderResult<RemotePlaylist>;

    /// Create an empty playlist owned by the token's account
    async fn create_playlist(&self, token: &str, title: &str) -> ProviderResult<PlaylistHandle>;

    /// Append a track, guarded by the caller's revision. Returns the new
    /// revision on success.
    async fn insert_track(
        &self,
        token: &str,
        handle: PlaylistHandle,
        track_id: i64,
        revision: i64,
    ) -> ProviderResult<i64>;

    /// Remove the track at a playlist position, guarded by revision.
    /// Returns the new revision on success.
    async fn delete_track_at(
        &self,
        token: &str,
        handle: PlaylistHandle,
        index: usize,
        revision: i64,
    ) -> ProviderResult<i64>;
}
