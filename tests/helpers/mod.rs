//! In-memory fakes for exercising the sync engine without Postgres or the
//! real music service.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use TuneCircle::models::music::NewMusic;
use TuneCircle::models::playlist::{PlaylistBinding, PlaylistHandle};
use TuneCircle::provider::{AlbumInfo, MusicProvider, RemotePlaylist, TrackInfo};
use TuneCircle::sync::SyncStore;
use TuneCircle::utils::errors::{ProviderError, ProviderResult, TuneCircleError};

// ---------------------------------------------------------------------------
// Store fake

#[derive(Default)]
struct StoreState {
    groups: HashMap<i64, String>,
    members: HashMap<i64, Vec<i64>>,
    tokens: HashMap<i64, String>,
    tracks: HashMap<i64, Vec<i64>>,
    bindings: HashMap<(i64, i64), PlaylistHandle>,
    imported: Vec<NewMusic>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&self, group_id: i64, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.groups.insert(group_id, name.to_string());
        state.members.entry(group_id).or_default();
    }

    pub fn add_member(&self, group_id: i64, user_id: i64) {
        self.state
            .lock()
            .unwrap()
            .members
            .entry(group_id)
            .or_default()
            .push(user_id);
    }

    pub fn set_token(&self, user_id: i64, token: &str) {
        self.state
            .lock()
            .unwrap()
            .tokens
            .insert(user_id, token.to_string());
    }

    pub fn add_track(&self, group_id: i64, catalog_id: i64) {
        self.state
            .lock()
            .unwrap()
            .tracks
            .entry(group_id)
            .or_default()
            .push(catalog_id);
    }

    pub fn bind(&self, user_id: i64, group_id: i64, handle: PlaylistHandle) {
        self.state
            .lock()
            .unwrap()
            .bindings
            .insert((user_id, group_id), handle);
    }

    pub fn binding_of(&self, user_id: i64, group_id: i64) -> Option<PlaylistHandle> {
        self.state
            .lock()
            .unwrap()
            .bindings
            .get(&(user_id, group_id))
            .copied()
    }

    pub fn group_tracks(&self, group_id: i64) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .tracks
            .get(&group_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn imported_count(&self) -> usize {
        self.state.lock().unwrap().imported.len()
    }
}

#[async_trait]
impl SyncStore for InMemoryStore {
    async fn group_name(&self, group_id: i64) -> Result<Option<String>, TuneCircleError> {
        Ok(self.state.lock().unwrap().groups.get(&group_id).cloned())
    }

    async fn member_ids(&self, group_id: i64) -> Result<Vec<i64>, TuneCircleError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .members
            .get(&group_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn group_ids_of(&self, user_id: i64) -> Result<Vec<i64>, TuneCircleError> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<i64> = state
            .members
            .iter()
            .filter(|(_, members)| members.contains(&user_id))
            .map(|(group_id, _)| *group_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn all_user_ids(&self) -> Result<Vec<i64>, TuneCircleError> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<i64> = state
            .members
            .values()
            .flatten()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn user_token(&self, user_id: i64) -> Result<Option<String>, TuneCircleError> {
        Ok(self.state.lock().unwrap().tokens.get(&user_id).cloned())
    }

    async fn group_track_catalog_ids(&self, group_id: i64) -> Result<Vec<i64>, TuneCircleError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .tracks
            .get(&group_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn binding(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<Option<PlaylistBinding>, TuneCircleError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .bindings
            .get(&(user_id, group_id))
            .map(|handle| PlaylistBinding {
                user_id,
                group_id,
                owner_uid: handle.owner_uid,
                kind: handle.kind,
            }))
    }

    async fn save_binding(
        &self,
        user_id: i64,
        group_id: i64,
        handle: PlaylistHandle,
    ) -> Result<(), TuneCircleError> {
        self.state
            .lock()
            .unwrap()
            .bindings
            .insert((user_id, group_id), handle);
        Ok(())
    }

    async fn insert_imported(&self, entry: NewMusic) -> Result<(), TuneCircleError> {
        let mut state = self.state.lock().unwrap();
        if let Some(group_id) = entry.group_id {
            state.tracks.entry(group_id).or_default().push(entry.catalog_id);
        }
        state.imported.push(entry);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Provider fake

struct PlaylistData {
    revision: i64,
    tracks: Vec<i64>,
}

#[derive(Default)]
struct ProviderState {
    accounts: HashMap<String, i64>,
    playlists: HashMap<(i64, i64), PlaylistData>,
    vanished: HashSet<(i64, i64)>,
    next_kind: i64,
    insert_calls: usize,
}

#[derive(Default)]
pub struct FakeProvider {
    state: Mutex<ProviderState>,
}

impl FakeProvider {
    pub fn new() -> Self {
        let provider = Self::default();
        provider.state.lock().unwrap().next_kind = 1000;
        provider
    }

    pub fn register_account(&self, token: &str, uid: i64) {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(token.to_string(), uid);
    }

    /// Seed a playlist as it already exists remotely
    pub fn seed_playlist(&self, handle: PlaylistHandle, tracks: Vec<i64>) {
        self.state.lock().unwrap().playlists.insert(
            (handle.owner_uid, handle.kind),
            PlaylistData {
                revision: 1,
                tracks,
            },
        );
    }

    /// Make an existing playlist disappear remotely
    pub fn vanish(&self, handle: PlaylistHandle) {
        let mut state = self.state.lock().unwrap();
        state.playlists.remove(&(handle.owner_uid, handle.kind));
        state.vanished.insert((handle.owner_uid, handle.kind));
    }

    pub fn playlist_tracks(&self, handle: PlaylistHandle) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .playlists
            .get(&(handle.owner_uid, handle.kind))
            .map(|p| p.tracks.clone())
            .unwrap_or_default()
    }

    pub fn insert_calls(&self) -> usize {
        self.state.lock().unwrap().insert_calls
    }
}

#[async_trait]
impl MusicProvider for FakeProvider {
    async fn resolve(&self, token: &str) -> ProviderResult<i64> {
        self.state
            .lock()
            .unwrap()
            .accounts
            .get(token)
            .copied()
            .ok_or(ProviderError::AuthFailed)
    }

    async fn liked_tracks(&self, token: &str, _count: usize) -> ProviderResult<Vec<TrackInfo>> {
        self.resolve(token).await?;
        Ok(Vec::new())
    }

    async fn search_tracks(&self, token: &str, _query: &str) -> ProviderResult<Vec<TrackInfo>> {
        self.resolve(token).await?;
        Ok(Vec::new())
    }

    async fn search_albums(&self, token: &str, _query: &str) -> ProviderResult<Vec<AlbumInfo>> {
        self.resolve(token).await?;
        Ok(Vec::new())
    }

    async fn track_info(&self, token: &str, track_id: i64) -> ProviderResult<TrackInfo> {
        self.resolve(token).await?;
        Ok(TrackInfo {
            id: track_id,
            title: format!("Track {track_id}"),
            artists: vec![],
            cover_uri: String::new(),
        })
    }

    async fn album_info(&self, token: &str, album_id: i64) -> ProviderResult<AlbumInfo> {
        self.resolve(token).await?;
        Ok(AlbumInfo {
            id: album_id,
            title: format!("Album {album_id}"),
            artists: vec![],
            cover_uri: String::new(),
        })
    }

    async fn get_playlist(
        &self,
        token: &str,
        handle: PlaylistHandle,
    ) -> ProviderResult<RemotePlaylist> {
        self.resolve(token).await?;
        let state = self.state.lock().unwrap();
        state
            .playlists
            .get(&(handle.owner_uid, handle.kind))
            .map(|p| RemotePlaylist {
                revision: p.revision,
                track_ids: p.tracks.clone(),
            })
            .ok_or(ProviderError::NotFound)
    }

    async fn create_playlist(&self, token: &str, _title: &str) -> ProviderResult<PlaylistHandle> {
        let uid = self.resolve(token).await?;
        let mut state = self.state.lock().unwrap();
        state.next_kind += 1;
        let kind = state.next_kind;
        state.playlists.insert(
            (uid, kind),
            PlaylistData {
                revision: 1,
                tracks: Vec::new(),
            },
        );
        Ok(PlaylistHandle {
            owner_uid: uid,
            kind,
        })
    }

    async fn insert_track(
        &self,
        token: &str,
        handle: PlaylistHandle,
        track_id: i64,
        revision: i64,
    ) -> ProviderResult<i64> {
        self.resolve(token).await?;
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        let playlist = state
            .playlists
            .get_mut(&(handle.owner_uid, handle.kind))
            .ok_or(ProviderError::NotFound)?;
        if playlist.revision != revision {
            return Err(ProviderError::RequestFailed("revision mismatch".to_string()));
        }
        playlist.tracks.push(track_id);
        playlist.revision += 1;
        Ok(playlist.revision)
    }

    async fn delete_track_at(
        &self,
        token: &str,
        handle: PlaylistHandle,
        index: usize,
        revision: i64,
    ) -> ProviderResult<i64> {
        self.resolve(token).await?;
        let mut state = self.state.lock().unwrap();
        let playlist = state
            .playlists
            .get_mut(&(handle.owner_uid, handle.kind))
            .ok_or(ProviderError::NotFound)?;
        if playlist.revision != revision {
            return Err(ProviderError::RequestFailed("revision mismatch".to_string()));
        }
        if index < playlist.tracks.len() {
            playlist.tracks.remove(index);
        }
        playlist.revision += 1;
        Ok(playlist.revision)
    }
}
