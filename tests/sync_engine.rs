//! Sync engine behavior against in-memory fakes

mod helpers;

use std::sync::Arc;

use assert_matches::assert_matches;

use helpers::{FakeProvider, InMemoryStore};
use TuneCircle::models::playlist::PlaylistHandle;
use TuneCircle::sync::SyncEngine;
use TuneCircle::utils::errors::{ProviderError, TuneCircleError};

const ALICE: i64 = 1;
const BOB: i64 = 2;
const CAROL: i64 = 3;
const GROUP: i64 = 10;

fn setup() -> (Arc<InMemoryStore>, Arc<FakeProvider>, SyncEngine) {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(FakeProvider::new());
    let engine = SyncEngine::new(store.clone(), provider.clone());
    (store, provider, engine)
}

#[tokio::test]
async fn on_demand_creates_playlist_and_pushes_log() {
    let (store, provider, engine) = setup();
    store.add_group(GROUP, "Swing Friends");
    store.add_member(GROUP, ALICE);
    store.set_token(ALICE, "tok-alice");
    provider.register_account("tok-alice", 100);
    for track in [11, 22, 33] {
        store.add_track(GROUP, track);
    }

    let outcome = engine.reconcile_on_demand(ALICE, GROUP).await.unwrap();

    assert_eq!(outcome.pushed, 3);
    assert_eq!(outcome.pulled, 0);
    assert!(!outcome.recreated);

    let handle = store.binding_of(ALICE, GROUP).expect("binding persisted");
    assert_eq!(provider.playlist_tracks(handle), vec![11, 22, 33]);
}

#[tokio::test]
async fn reconciliation_is_idempotent() {
    let (store, provider, engine) = setup();
    store.add_group(GROUP, "Swing Friends");
    store.add_member(GROUP, ALICE);
    store.set_token(ALICE, "tok-alice");
    provider.register_account("tok-alice", 100);
    store.add_track(GROUP, 11);
    store.add_track(GROUP, 22);

    let first = engine.reconcile_on_demand(ALICE, GROUP).await.unwrap();
    let second = engine.reconcile_on_demand(ALICE, GROUP).await.unwrap();

    assert_eq!(first.pushed, 2);
    assert_eq!(second.pushed, 0);
    assert_eq!(second.pulled, 0);
    // No remote insertions at all on the second run
    assert_eq!(provider.insert_calls(), 2);
}

#[tokio::test]
async fn duplicate_log_entries_push_once() {
    let (store, provider, engine) = setup();
    store.add_group(GROUP, "Swing Friends");
    store.add_member(GROUP, ALICE);
    store.set_token(ALICE, "tok-alice");
    provider.register_account("tok-alice", 100);
    // The same track shared twice into the group
    store.add_track(GROUP, 11);
    store.add_track(GROUP, 11);

    let outcome = engine.reconcile_on_demand(ALICE, GROUP).await.unwrap();

    assert_eq!(outcome.pushed, 1);
    let handle = store.binding_of(ALICE, GROUP).unwrap();
    assert_eq!(provider.playlist_tracks(handle), vec![11]);
}

#[tokio::test]
async fn pull_discovers_remote_tracks_and_propagates_to_members() {
    let (store, provider, engine) = setup();
    store.add_group(GROUP, "Swing Friends");
    store.add_member(GROUP, ALICE);
    store.add_member(GROUP, BOB);
    store.set_token(ALICE, "tok-alice");
    store.set_token(BOB, "tok-bob");
    provider.register_account("tok-alice", 100);
    provider.register_account("tok-bob", 200);

    // Alice added track 99 straight into her playlist, outside the bot.
    let alice_handle = PlaylistHandle {
        owner_uid: 100,
        kind: 7,
    };
    provider.seed_playlist(alice_handle, vec![99]);
    store.bind(ALICE, GROUP, alice_handle);

    // Bob already has a bound (empty) playlist.
    let bob_handle = PlaylistHandle {
        owner_uid: 200,
        kind: 8,
    };
    provider.seed_playlist(bob_handle, vec![]);
    store.bind(BOB, GROUP, bob_handle);

    let outcome = engine.reconcile_on_demand(ALICE, GROUP).await.unwrap();

    assert_eq!(outcome.pulled, 1);
    assert_eq!(store.imported_count(), 1);
    assert_eq!(store.group_tracks(GROUP), vec![99]);
    // The discovery reached Bob's playlist through propagation.
    assert_eq!(provider.playlist_tracks(bob_handle), vec![99]);
}

#[tokio::test]
async fn non_member_cannot_reconcile_into_group_log() {
    let (store, provider, engine) = setup();
    store.add_group(GROUP, "Swing Friends");
    store.add_member(GROUP, ALICE);

    // Carol never joined the group, yet holds a token and a playlist of her
    // own. A forged callback must not let her feed the group log.
    store.set_token(CAROL, "tok-carol");
    provider.register_account("tok-carol", 300);
    let carol_handle = PlaylistHandle {
        owner_uid: 300,
        kind: 9,
    };
    provider.seed_playlist(carol_handle, vec![777]);
    store.bind(CAROL, GROUP, carol_handle);

    let result = engine.reconcile_on_demand(CAROL, GROUP).await;

    assert_matches!(result, Err(TuneCircleError::InvalidInput(_)));
    assert!(store.group_tracks(GROUP).is_empty());
    assert_eq!(store.imported_count(), 0);
}

#[tokio::test]
async fn mixed_state_reports_push_and_pull_separately() {
    let (store, provider, engine) = setup();
    store.add_group(GROUP, "Swing Friends");
    store.add_member(GROUP, ALICE);
    store.set_token(ALICE, "tok-alice");
    provider.register_account("tok-alice", 100);

    // Track 11 lives only in the log, track 99 only in Alice's playlist.
    store.add_track(GROUP, 11);
    let handle = PlaylistHandle {
        owner_uid: 100,
        kind: 7,
    };
    provider.seed_playlist(handle, vec![99]);
    store.bind(ALICE, GROUP, handle);

    let outcome = engine.reconcile_on_demand(ALICE, GROUP).await.unwrap();

    assert_eq!(outcome.pushed, 1);
    assert_eq!(outcome.pulled, 1);
    assert_eq!(provider.playlist_tracks(handle), vec![99, 11]);
    assert_eq!(store.group_tracks(GROUP), vec![11, 99]);
}

#[tokio::test]
async fn vanished_playlist_is_recreated_and_rebound() {
    let (store, provider, engine) = setup();
    store.add_group(GROUP, "Swing Friends");
    store.add_member(GROUP, ALICE);
    store.set_token(ALICE, "tok-alice");
    provider.register_account("tok-alice", 100);
    store.add_track(GROUP, 11);

    let stale = PlaylistHandle {
        owner_uid: 100,
        kind: 7,
    };
    store.bind(ALICE, GROUP, stale);
    provider.vanish(stale);

    let outcome = engine.reconcile_on_demand(ALICE, GROUP).await.unwrap();

    assert!(outcome.recreated);
    let fresh = store.binding_of(ALICE, GROUP).unwrap();
    assert_ne!(fresh, stale);
    // The group log survived intact and landed in the new playlist.
    assert_eq!(provider.playlist_tracks(fresh), vec![11]);
}

#[tokio::test]
async fn on_demand_without_token_fails_with_auth_error() {
    let (store, _provider, engine) = setup();
    store.add_group(GROUP, "Swing Friends");
    store.add_member(GROUP, ALICE);

    let result = engine.reconcile_on_demand(ALICE, GROUP).await;

    assert_matches!(
        result,
        Err(TuneCircleError::Provider(ProviderError::AuthFailed))
    );
}

#[tokio::test]
async fn scheduled_path_skips_users_without_binding() {
    let (store, provider, engine) = setup();
    store.add_group(GROUP, "Swing Friends");
    store.add_member(GROUP, ALICE);
    store.set_token(ALICE, "tok-alice");
    provider.register_account("tok-alice", 100);
    store.add_track(GROUP, 11);

    let outcome = engine.reconcile_scheduled(ALICE, GROUP).await.unwrap();

    assert!(outcome.skipped);
    assert_eq!(provider.insert_calls(), 0);
    assert!(store.binding_of(ALICE, GROUP).is_none());
}

#[tokio::test]
async fn sweep_isolates_failures_per_pair() {
    let (store, provider, engine) = setup();
    store.add_group(GROUP, "Swing Friends");
    store.add_member(GROUP, ALICE);
    store.add_member(GROUP, BOB);
    store.add_track(GROUP, 11);

    // Alice's token is stale; the provider no longer knows it.
    store.set_token(ALICE, "tok-stale");
    let alice_handle = PlaylistHandle {
        owner_uid: 100,
        kind: 7,
    };
    store.bind(ALICE, GROUP, alice_handle);

    // Bob is healthy and bound.
    store.set_token(BOB, "tok-bob");
    provider.register_account("tok-bob", 200);
    let bob_handle = PlaylistHandle {
        owner_uid: 200,
        kind: 8,
    };
    provider.seed_playlist(bob_handle, vec![]);
    store.bind(BOB, GROUP, bob_handle);

    let report = engine.sweep().await;

    assert_eq!(report.pairs, 2);
    assert_eq!(report.failures, 1);
    assert_eq!(report.synced, 1);
    // Bob still got the track despite Alice's failure.
    assert_eq!(provider.playlist_tracks(bob_handle), vec![11]);
}

#[tokio::test]
async fn sweep_recreates_vanished_playlists() {
    let (store, provider, engine) = setup();
    store.add_group(GROUP, "Swing Friends");
    store.add_member(GROUP, ALICE);
    store.set_token(ALICE, "tok-alice");
    provider.register_account("tok-alice", 100);
    store.add_track(GROUP, 11);

    let stale = PlaylistHandle {
        owner_uid: 100,
        kind: 7,
    };
    store.bind(ALICE, GROUP, stale);
    provider.vanish(stale);

    let report = engine.sweep().await;

    assert_eq!(report.failures, 0);
    assert_eq!(report.synced, 1);
    let fresh = store.binding_of(ALICE, GROUP).unwrap();
    assert_ne!(fresh, stale);
    assert_eq!(provider.playlist_tracks(fresh), vec![11]);
}
