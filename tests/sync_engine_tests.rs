// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync engine behavior against in-memory backends.
//!
//! Local effects are checked right after each call (they are synchronous);
//! remote effects after `settle()`.

use activity_sync::db::memory::Operation;
use activity_sync::db::{image_object_path, MemoryBackend};
use activity_sync::error::AppError;
use activity_sync::models::{ActivityId, ActivityImage, SyncStatus};
use common::{sample_activity, test_store, BridgeCall};
use serde_json::json;
use std::time::Duration;

mod common;

fn ids(activities: &[activity_sync::models::Activity]) -> Vec<&str> {
    activities.iter().map(|a| a.id.as_str()).collect()
}

// ─── Create / Update ─────────────────────────────────────────

#[tokio::test]
async fn test_create_adds_to_created_and_joined() {
    let mut t = test_store();
    t.store.create(sample_activity("a", "Picnic")).unwrap();

    assert_eq!(ids(t.store.created()), ["a"]);
    assert_eq!(ids(t.store.joined()), ["a"]);
    assert_eq!(
        t.store.sync_status(&ActivityId::new("a")),
        Some(SyncStatus::LocalOnly)
    );
    assert_eq!(t.bridge.calls(), [BridgeCall::Schedule("a".to_string())]);

    t.store.settle().await;
    assert_eq!(t.remote.row_count(), 1);
    assert_eq!(t.remote.record("a").unwrap().title, "Picnic");
    assert_eq!(
        t.store.sync_status(&ActivityId::new("a")),
        Some(SyncStatus::Synced)
    );
}

#[tokio::test]
async fn test_create_rejects_invalid_activity() {
    let mut t = test_store();
    let mut bad = sample_activity("a", "");
    bad.latitude = 120.0;

    assert!(matches!(t.store.create(bad), Err(AppError::BadRequest(_))));
    assert!(t.store.created().is_empty());
    assert_eq!(t.store.in_flight(), 0);
}

#[tokio::test]
async fn test_create_then_update_leaves_one_row_and_one_entry() {
    let mut t = test_store();
    // Slow insert: the update must still land after it.
    t.remote.delay_next(Operation::Insert, Duration::from_millis(50));

    t.store.create(sample_activity("a", "Draft")).unwrap();
    t.store.update(sample_activity("a", "Final")).unwrap();

    assert_eq!(t.store.created().len(), 1);
    assert_eq!(t.store.created()[0].title, "Final");

    t.store.settle().await;
    assert_eq!(t.remote.row_count(), 1);
    assert_eq!(t.remote.record("a").unwrap().title, "Final");
    assert_eq!(t.remote.calls(), [Operation::Insert, Operation::Update]);
}

#[tokio::test]
async fn test_update_replaces_in_place_preserving_order() {
    let mut t = test_store();
    for (id, title) in [("a", "A"), ("b", "B"), ("c", "C")] {
        t.store.create(sample_activity(id, title)).unwrap();
    }
    t.store.update(sample_activity("b", "B2")).unwrap();

    let titles: Vec<&str> = t.store.created().iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, ["A", "B2", "C"]);
    let titles: Vec<&str> = t.store.joined().iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, ["A", "B2", "C"]);
}

#[tokio::test]
async fn test_update_unknown_activity_is_not_found() {
    let mut t = test_store();
    let result = t.store.update(sample_activity("ghost", "Ghost"));
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(t.remote.calls().is_empty());
}

#[tokio::test]
async fn test_update_of_joined_remote_activity_is_visible_immediately() {
    let mut t = test_store();
    t.remote.seed_activity(&sample_activity("r", "Server")).unwrap();
    t.store.refresh().await.unwrap();
    let fetched = t.store.get(&ActivityId::new("r")).unwrap();
    t.store.join(fetched);

    t.store.update(sample_activity("r", "Edited")).unwrap();
    assert_eq!(t.store.get(&ActivityId::new("r")).unwrap().title, "Edited");

    t.store.settle().await;
    assert_eq!(t.remote.record("r").unwrap().title, "Edited");
    assert_eq!(t.remote.row_count(), 1);
}

// ─── Failures ────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_insert_keeps_local_copy() {
    let mut t = test_store();
    t.remote.fail_next(Operation::Insert, 1);

    t.store.create(sample_activity("a", "Offline")).unwrap();
    t.store.settle().await;

    assert_eq!(ids(t.store.created()), ["a"]);
    assert_eq!(ids(t.store.joined()), ["a"]);
    assert_eq!(t.remote.row_count(), 0);
    assert_eq!(
        t.store.sync_status(&ActivityId::new("a")),
        Some(SyncStatus::SyncFailed)
    );
}

#[tokio::test]
async fn test_status_follows_latest_mutation() {
    let mut t = test_store();
    // The insert is slow and fails; the update after it succeeds.
    t.remote.delay_next(Operation::Insert, Duration::from_millis(30));
    t.remote.fail_next(Operation::Insert, 1);

    t.store.create(sample_activity("a", "First")).unwrap();
    t.store.update(sample_activity("a", "Second")).unwrap();
    t.store.settle().await;

    assert_eq!(
        t.store.sync_status(&ActivityId::new("a")),
        Some(SyncStatus::Synced)
    );
}

#[tokio::test]
async fn test_fetch_failure_keeps_previous_cache() {
    let mut t = test_store();
    t.remote.seed_activity(&sample_activity("r", "Remote")).unwrap();
    t.store.refresh().await.unwrap();

    t.remote.set_offline(true);
    assert!(t.store.refresh().await.is_err());

    assert_eq!(ids(t.store.remote_cache()), ["r"]);
    assert_eq!(ids(&t.store.visible()), ["r"]);
}

#[tokio::test]
async fn test_malformed_rows_are_dropped_not_fatal() {
    let mut t = test_store();
    t.remote.seed_activity(&sample_activity("good", "Good")).unwrap();
    t.remote.seed_row(json!({ "id": "bad", "title": 42 }));
    t.remote.seed_row(json!({
        "id": "bad-date",
        "title": "Bad date",
        "category": "music",
        "date": f64::MAX,
        "location_name": "Nowhere",
        "latitude": 0.0,
        "longitude": 0.0,
        "color_red": 0.0,
        "color_green": 0.0,
        "color_blue": 0.0
    }));

    let report = t.store.refresh().await.unwrap();
    assert_eq!(report.fetched, 1);
    assert_eq!(report.dropped, 2);
    assert_eq!(ids(t.store.remote_cache()), ["good"]);
}

#[tokio::test]
async fn test_fetch_never_touches_local_collections() {
    let mut t = test_store();
    t.store.create(sample_activity("mine", "Mine")).unwrap();
    t.store.toggle_favorite(&ActivityId::new("mine"));
    t.store.settle().await;

    // Remote loses the row behind our back.
    t.remote.remove_row("mine");
    t.store.refresh().await.unwrap();

    assert_eq!(ids(t.store.created()), ["mine"]);
    assert_eq!(ids(t.store.joined()), ["mine"]);
    assert!(t.store.is_favorite(&ActivityId::new("mine")));
    assert_eq!(ids(&t.store.visible()), ["mine"]);
}

// ─── Merge ───────────────────────────────────────────────────

#[tokio::test]
async fn test_remote_copy_wins_in_merged_view() {
    let mut t = test_store();
    t.store.create(sample_activity("a", "Local title")).unwrap();
    t.store.settle().await;

    let mut server = sample_activity("a", "Server title");
    server.description = "Edited elsewhere".to_string();
    server.latitude = 10.0;
    t.remote.remove_row("a");
    t.remote.seed_activity(&server).unwrap();
    t.store.refresh().await.unwrap();

    let visible = t.store.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "Server title");
    assert_eq!(visible[0].description, "Edited elsewhere");
    assert_eq!(visible[0].latitude, 10.0);
    assert_eq!(visible[0].scheduled_at, server.scheduled_at);
}

#[tokio::test]
async fn test_fallback_has_lowest_priority() {
    let mut t = common::test_store_with_fallback(vec![
        sample_activity("shared", "Fallback"),
        sample_activity("only-fallback", "Default"),
    ]);
    t.store.create(sample_activity("shared", "Created")).unwrap();

    let visible = t.store.visible();
    assert_eq!(ids(&visible), ["shared", "only-fallback"]);
    assert_eq!(visible[0].title, "Created");
}

// ─── Delete ──────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_is_local_first_and_final() {
    let mut t = test_store();
    t.store.create(sample_activity("a", "Doomed")).unwrap();
    t.store.toggle_favorite(&ActivityId::new("a"));
    t.store.settle().await;

    t.store.delete(&ActivityId::new("a")).unwrap();
    assert!(t.store.created().is_empty());
    assert!(t.store.joined().is_empty());
    assert!(!t.store.is_favorite(&ActivityId::new("a")));
    assert_eq!(
        t.store.sync_status(&ActivityId::new("a")),
        Some(SyncStatus::Deleted)
    );
    assert!(t
        .bridge
        .calls()
        .contains(&BridgeCall::Cancel("a".to_string())));

    t.store.settle().await;
    assert_eq!(t.remote.row_count(), 0);
    assert!(t.remote.calls().contains(&Operation::Remove));
}

#[tokio::test]
async fn test_stale_fetch_does_not_resurrect_deleted_activity() {
    let mut t = test_store();
    t.remote.seed_activity(&sample_activity("a", "Remote")).unwrap();
    t.store.refresh().await.unwrap();
    let fetched = t.store.get(&ActivityId::new("a")).unwrap();
    t.store.join(fetched);

    // Remote delete fails, so the next fetch still returns the row.
    t.remote.fail_next(Operation::Delete, 1);
    t.store.delete(&ActivityId::new("a")).unwrap();
    t.store.settle().await;
    t.store.refresh().await.unwrap();

    assert!(t.store.joined().is_empty());
    assert!(t.store.created().is_empty());
    assert!(t.store.visible().is_empty());
    assert_eq!(
        t.store.sync_status(&ActivityId::new("a")),
        Some(SyncStatus::Deleted)
    );
}

#[tokio::test]
async fn test_confirmed_delete_drops_tombstone_after_fetch() {
    let mut t = test_store();
    t.remote.seed_activity(&sample_activity("a", "Remote")).unwrap();
    t.store.refresh().await.unwrap();

    t.store.delete(&ActivityId::new("a")).unwrap();
    t.store.settle().await;
    assert_eq!(
        t.store.sync_status(&ActivityId::new("a")),
        Some(SyncStatus::Deleted)
    );

    t.store.refresh().await.unwrap();
    assert_eq!(t.store.sync_status(&ActivityId::new("a")), None);

    // Another client re-inserting the id is no longer masked.
    t.remote.seed_activity(&sample_activity("a", "Back")).unwrap();
    t.store.refresh().await.unwrap();
    assert_eq!(ids(&t.store.visible()), ["a"]);
}

#[tokio::test]
async fn test_tombstone_kept_while_fetch_still_returns_row() {
    let mut t = test_store();
    t.remote.seed_activity(&sample_activity("a", "Remote")).unwrap();
    t.store.refresh().await.unwrap();

    // The fetch races the delete and still sees the row.
    let stale = t.store.begin_refresh().await;
    t.store.delete(&ActivityId::new("a")).unwrap();
    t.store.settle().await;
    t.store.apply_fetch(stale).unwrap();

    assert!(t.store.visible().is_empty());
    assert_eq!(
        t.store.sync_status(&ActivityId::new("a")),
        Some(SyncStatus::Deleted)
    );
}

#[tokio::test]
async fn test_recreate_after_delete_is_visible_again() {
    let mut t = test_store();
    t.store.create(sample_activity("a", "First")).unwrap();
    t.store.delete(&ActivityId::new("a")).unwrap();
    t.store.create(sample_activity("a", "Again")).unwrap();
    t.store.settle().await;

    assert_eq!(ids(&t.store.visible()), ["a"]);
    assert_eq!(t.remote.record("a").unwrap().title, "Again");
    assert_eq!(
        t.remote.calls(),
        [
            Operation::Insert,
            Operation::Delete,
            Operation::Remove,
            Operation::Insert
        ]
    );
}

#[tokio::test]
async fn test_delete_unknown_activity_is_not_found() {
    let mut t = test_store();
    assert!(matches!(
        t.store.delete(&ActivityId::new("ghost")),
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_image_cleanup_failure_is_ignored() {
    let mut t = test_store();
    t.store.create(sample_activity("a", "Doomed")).unwrap();
    t.store.settle().await;

    t.remote.fail_next(Operation::Remove, 1);
    t.store.delete(&ActivityId::new("a")).unwrap();
    t.store.settle().await;

    assert_eq!(t.remote.row_count(), 0);
    assert!(t.store.remote_cache().is_empty());
}

// ─── Join / Leave / Favorite ─────────────────────────────────

#[tokio::test]
async fn test_join_is_idempotent() {
    let mut t = test_store();
    let activity = sample_activity("a", "Concert");
    t.store.join(activity.clone());
    t.store.join(activity);

    assert_eq!(ids(t.store.joined()), ["a"]);
    assert_eq!(t.bridge.calls(), [BridgeCall::Schedule("a".to_string())]);
    assert!(t.remote.calls().is_empty());
}

#[tokio::test]
async fn test_leave_cancels_reminders_once() {
    let mut t = test_store();
    t.store.join(sample_activity("a", "Concert"));
    t.store.leave(&ActivityId::new("a"));
    t.store.leave(&ActivityId::new("a"));

    assert!(t.store.joined().is_empty());
    assert_eq!(
        t.bridge.calls(),
        [
            BridgeCall::Schedule("a".to_string()),
            BridgeCall::Cancel("a".to_string())
        ]
    );
}

#[tokio::test]
async fn test_toggle_favorite_is_local_only() {
    let mut t = test_store();
    let id = ActivityId::new("a");
    assert!(t.store.toggle_favorite(&id));
    assert!(t.store.is_favorite(&id));
    assert!(!t.store.toggle_favorite(&id));
    assert!(!t.store.is_favorite(&id));
    assert!(t.remote.calls().is_empty());
}

// ─── Ordering ────────────────────────────────────────────────

#[tokio::test]
async fn test_different_ids_do_not_wait_for_each_other() {
    let mut t = test_store();
    t.remote.seed_activity(&sample_activity("slow", "Slow")).unwrap();
    t.store.refresh().await.unwrap();
    let fetched = t.store.get(&ActivityId::new("slow")).unwrap();
    t.store.join(fetched);

    t.remote.delay_next(Operation::Update, Duration::from_millis(300));
    t.store.update(sample_activity("slow", "Slow edit")).unwrap();
    t.store.create(sample_activity("fast", "Fast")).unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    t.store.poll_completed();
    assert_eq!(
        t.store.sync_status(&ActivityId::new("fast")),
        Some(SyncStatus::Synced)
    );
    assert_eq!(
        t.store.sync_status(&ActivityId::new("slow")),
        Some(SyncStatus::LocalOnly)
    );

    t.store.settle().await;
    assert_eq!(
        t.store.sync_status(&ActivityId::new("slow")),
        Some(SyncStatus::Synced)
    );
}

// ─── Images ──────────────────────────────────────────────────

#[tokio::test]
async fn test_embedded_image_is_uploaded_and_replaced_by_url() {
    let mut t = test_store();
    let mut activity = sample_activity("a", "Gallery");
    activity.image = Some(ActivityImage::Embedded(common::png_bytes(32, 24)));

    t.store.create(activity).unwrap();
    t.store.settle().await;

    let path = image_object_path("a");
    let stored = t.remote.object(&path).expect("image uploaded");
    assert_eq!(stored.content_type, "image/jpeg");
    let decoded = image::load_from_memory(&stored.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (32, 24));

    let url = MemoryBackend::public_url(&path);
    assert_eq!(t.remote.record("a").unwrap().image_url.as_deref(), Some(url.as_str()));
    assert_eq!(t.store.created()[0].image_url(), Some(url.as_str()));
    assert!(t.store.joined()[0].embedded_image().is_none());

    // The substituted URL is what a restart restores.
    let reopened = t.reopen();
    assert_eq!(reopened.created()[0].image_url(), Some(url.as_str()));
}

#[tokio::test]
async fn test_failed_upload_keeps_embedded_image() {
    let mut t = test_store();
    t.remote.fail_next(Operation::Upload, 1);
    let mut activity = sample_activity("a", "Gallery");
    activity.image = Some(ActivityImage::Embedded(common::png_bytes(8, 8)));

    t.store.create(activity).unwrap();
    t.store.settle().await;

    assert_eq!(t.remote.row_count(), 0);
    assert!(t.store.created()[0].embedded_image().is_some());
    assert_eq!(
        t.store.sync_status(&ActivityId::new("a")),
        Some(SyncStatus::SyncFailed)
    );
}

#[tokio::test]
async fn test_oversized_image_is_downscaled_before_upload() {
    let mut t = test_store();
    let mut activity = sample_activity("a", "Panorama");
    activity.image = Some(ActivityImage::Embedded(common::png_bytes(2048, 512)));

    t.store.create(activity).unwrap();
    t.store.settle().await;

    let stored = t.remote.object(&image_object_path("a")).expect("image uploaded");
    let decoded = image::load_from_memory(&stored.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1024, 256));
}

#[tokio::test]
async fn test_image_update_on_fetched_activity_shows_url() {
    let mut t = test_store();
    t.remote.seed_activity(&sample_activity("r", "Server")).unwrap();
    t.store.refresh().await.unwrap();
    let fetched = t.store.get(&ActivityId::new("r")).unwrap();
    t.store.join(fetched);

    let mut edited = sample_activity("r", "Server");
    edited.image = Some(ActivityImage::Embedded(common::png_bytes(16, 16)));
    t.store.update(edited).unwrap();
    t.store.settle().await;

    let url = MemoryBackend::public_url(&image_object_path("r"));
    assert_eq!(
        t.store.sync_status(&ActivityId::new("r")),
        Some(SyncStatus::Synced)
    );
    assert_eq!(t.store.joined()[0].image_url(), Some(url.as_str()));

    let visible = t.store.get(&ActivityId::new("r")).unwrap();
    assert!(visible.embedded_image().is_none());
    assert_eq!(visible.image_url(), Some(url.as_str()));
}

// ─── Persistence ─────────────────────────────────────────────

#[tokio::test]
async fn test_collections_survive_restart() {
    let mut t = test_store();
    t.store.create(sample_activity("mine", "Mine")).unwrap();
    t.store.join(sample_activity("theirs", "Theirs"));
    t.store.toggle_favorite(&ActivityId::new("theirs"));

    let reopened = t.reopen();
    assert_eq!(ids(reopened.created()), ["mine"]);
    assert_eq!(ids(reopened.joined()), ["mine", "theirs"]);
    assert!(reopened.is_favorite(&ActivityId::new("theirs")));
}

#[tokio::test]
async fn test_corrupt_saved_value_loads_as_empty() {
    use activity_sync::persistence::{keys, LocalStore};

    let t = test_store();
    t.local
        .set(keys::CREATED_ACTIVITIES, b"{not json")
        .unwrap();
    let reopened = t.reopen();
    assert!(reopened.created().is_empty());
}
