//! HTTP client for the music provider API

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::models::playlist::PlaylistHandle;
use crate::provider::types::{
    AccountStatus, AlbumInfo, ApiAlbum, ApiPlaylist, ApiResponse, ApiRevision, ApiTrack,
    LikedTracks, RemotePlaylist, SearchResult, TrackInfo,
};
use crate::provider::MusicProvider;
use crate::utils::errors::{ProviderError, ProviderResult, TuneCircleError};

use async_trait::async_trait;

/// Music provider client backed by the remote HTTP API
#[derive(Debug, Clone)]
pub struct HttpMusicProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMusicProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, TuneCircleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn map_send_error(err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::RequestFailed(err.to_string())
        }
    }

    fn check_status(status: StatusCode) -> ProviderResult<()> {
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::AuthFailed),
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound),
            s => Err(ProviderError::RequestFailed(format!(
                "unexpected status {s}"
            ))),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &str, path: &str) -> ProviderResult<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("OAuth {token}"))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::check_status(response.status())?;

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("malformed response: {e}")))?;

        Ok(body.result)
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        form: &[(&str, String)],
    ) -> ProviderResult<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("OAuth {token}"))
            .form(form)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::check_status(response.status())?;

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("malformed response: {e}")))?;

        Ok(body.result)
    }
}

#[async_trait]
impl MusicProvider for HttpMusicProvider {
    async fn resolve(&self, token: &str) -> ProviderResult<i64> {
        let status: AccountStatus = self.get_json(token, "/account/status").await?;
        Ok(status.account.uid)
    }

    async fn liked_tracks(&self, token: &str, count: usize) -> ProviderResult<Vec<TrackInfo>> {
        let uid = self.resolve(token).await?;
        let likes: LikedTracks = self
            .get_json(token, &format!("/users/{uid}/likes/tracks"))
            .await?;

        let mut tracks = Vec::with_capacity(count.min(likes.tracks.len()));
        for liked in likes.tracks.into_iter().take(count) {
            tracks.push(self.track_info(token, liked.id).await?);
        }

        Ok(tracks)
    }

    async fn search_tracks(&self, token: &str, query: &str) -> ProviderResult<Vec<TrackInfo>> {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let result: SearchResult = self
            .get_json(token, &format!("/search?text={encoded}&type=track"))
            .await?;

        Ok(result
            .tracks
            .map(|page| page.results.into_iter().map(TrackInfo::from).collect())
            .unwrap_or_default())
    }

    async fn search_albums(&self, token: &str, query: &str) -> ProviderResult<Vec<AlbumInfo>> {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let result: SearchResult = self
            .get_json(token, &format!("/search?text={encoded}&type=album"))
            .await?;

        Ok(result
            .albums
            .map(|page| page.results.into_iter().map(AlbumInfo::from).collect())
            .unwrap_or_default())
    }

    async fn track_info(&self, token: &str, track_id: i64) -> ProviderResult<TrackInfo> {
        let track: ApiTrack = self.get_json(token, &format!("/tracks/{track_id}")).await?;
        Ok(track.into())
    }

    async fn album_info(&self, token: &str, album_id: i64) -> ProviderResult<AlbumInfo> {
        let album: ApiAlbum = self.get_json(token, &format!("/albums/{album_id}")).await?;
        Ok(album.into())
    }

    async fn get_playlist(
        &self,
        token: &str,
        handle: PlaylistHandle,
    ) -> ProviderResult<RemotePlaylist> {
        let playlist: ApiPlaylist = self
            .get_json(
                token,
                &format!("/users/{}/playlists/{}", handle.owner_uid, handle.kind),
            )
            .await?;

        Ok(RemotePlaylist {
            revision: playlist.revision,
            track_ids: playlist.tracks.into_iter().map(|t| t.id).collect(),
        })
    }

    async fn create_playlist(&self, token: &str, title: &str) -> ProviderResult<PlaylistHandle> {
        let uid = self.resolve(token).await?;
        let playlist: ApiPlaylist = self
            .post_form(
                token,
                &format!("/users/{uid}/playlists/create"),
                &[
                    ("title", title.to_string()),
                    ("visibility", "public".to_string()),
                ],
            )
            .await?;

        Ok(PlaylistHandle {
            owner_uid: playlist.owner.uid,
            kind: playlist.kind,
        })
    }

    async fn insert_track(
        &self,
        token: &str,
        handle: PlaylistHandle,
        track_id: i64,
        revision: i64,
    ) -> ProviderResult<i64> {
        let diff = serde_json::json!([
            {"op": "insert", "at": 0, "tracks": [{"id": track_id}]}
        ]);

        let result: ApiRevision = self
            .post_form(
                token,
                &format!(
                    "/users/{}/playlists/{}/change-relative",
                    handle.owner_uid, handle.kind
                ),
                &[("diff", diff.to_string()), ("revision", revision.to_string())],
            )
            .await?;

        Ok(result.revision)
    }

    async fn delete_track_at(
        &self,
        token: &str,
        handle: PlaylistHandle,
        index: usize,
        revision: i64,
    ) -> ProviderResult<i64> {
        let diff = serde_json::json!([
            {"op": "delete", "from": index, "to": index + 1}
        ]);

        let result: ApiRevision = self
            .post_form(
                token,
                &format!(
                    "/users/{}/playlists/{}/change-relative",
                    handle.owner_uid, handle.kind
                ),
                &[("diff", diff.to_string()), ("revision", revision.to_string())],
            )
            .await?;

        Ok(result.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> HttpMusicProvider {
        HttpMusicProvider::new(&ProviderConfig {
            api_url: server.uri(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn resolve_returns_account_uid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/account/status"))
            .and(header("Authorization", "OAuth token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"account": {"uid": 4242}}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        assert_eq!(provider.resolve("token-1").await.unwrap(), 4242);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/account/status"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        assert_matches!(
            provider.resolve("bad").await,
            Err(ProviderError::AuthFailed)
        );
    }

    #[tokio::test]
    async fn missing_playlist_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/7/playlists/1001"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let handle = PlaylistHandle {
            owner_uid: 7,
            kind: 1001,
        };
        assert_matches!(
            provider.get_playlist("t", handle).await,
            Err(ProviderError::NotFound)
        );
    }

    #[tokio::test]
    async fn get_playlist_parses_tracks_and_revision() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/7/playlists/1001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {
                    "kind": 1001,
                    "revision": 3,
                    "owner": {"uid": 7},
                    "tracks": [{"id": 11}, {"id": 22}]
                }
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let handle = PlaylistHandle {
            owner_uid: 7,
            kind: 1001,
        };
        let playlist = provider.get_playlist("t", handle).await.unwrap();
        assert_eq!(playlist.revision, 3);
        assert_eq!(playlist.track_ids, vec![11, 22]);
    }

    #[tokio::test]
    async fn insert_track_returns_new_revision() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/7/playlists/1001/change-relative"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {"revision": 4}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let handle = PlaylistHandle {
            owner_uid: 7,
            kind: 1001,
        };
        assert_eq!(provider.insert_track("t", handle, 33, 3).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn search_tracks_parses_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {
                    "tracks": {
                        "results": [
                            {"id": 5, "title": "Avalon", "artists": [{"name": "Chick Webb"}],
                             "cover_uri": "img.example/5/%%"}
                        ]
                    }
                }
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let tracks = provider.search_tracks("t", "avalon swing").await.unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].display_title(), "Chick Webb - Avalon");
    }
}
