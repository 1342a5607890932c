// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity store: the sync engine.
//!
//! Handles the core workflow:
//! 1. Apply every user intent to the local collections immediately
//! 2. Persist the touched collections in the same call
//! 3. Queue the remote write (per-id ordered) as a background task
//! 4. Apply finished remote outcomes back on the owning context
//!
//! Local changes are never rolled back when a remote write fails; the
//! per-activity `SyncStatus` exposes the divergence instead.

use crate::db::{image_object_path, ObjectStorage, RemoteStore};
use crate::error::{AppError, Result};
use crate::models::activity::decode_batch;
use crate::models::{Activity, ActivityId, FilterConfiguration, RemoteActivityRecord, SyncStatus};
use crate::persistence::{keys, load_json, save_json, LocalStore};
use crate::services::bridge::NotificationBridge;
use crate::services::filter::{self, FilterContext};
use crate::services::codec::ImageCodec;
use crate::services::merge::{merge, MergeSources};
use crate::services::queue::OperationQueue;
use chrono::{FixedOffset, Offset, Utc};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use validator::Validate;

/// Collaborators the store talks to.
#[derive(Clone)]
pub struct SyncBackends {
    pub remote: Arc<dyn RemoteStore>,
    pub objects: Arc<dyn ObjectStorage>,
    pub local: Arc<dyn LocalStore>,
    pub notifications: Arc<dyn NotificationBridge>,
    pub codec: Arc<dyn ImageCodec>,
}

/// Summary of a completed fetch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchReport {
    /// Activities now in the remote cache
    pub fetched: usize,
    /// Rows skipped because they failed conversion
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteWrite {
    Insert,
    Update,
}

/// A finished remote operation, waiting to be applied on the owner.
struct SyncOutcome {
    activity_id: ActivityId,
    seq: u64,
    result: OutcomeResult,
}

enum OutcomeResult {
    /// Insert/update finished; carries the uploaded image URL, if any.
    Written(Result<Option<String>>),
    Deleted(Result<()>),
}

/// Owner of the activity collections.
///
/// All reads and writes of the collections happen through `&self`/`&mut self`
/// on whatever context owns the store; background tasks only produce
/// outcomes, which `poll_completed` or `settle` apply.
pub struct ActivityStore {
    backends: SyncBackends,
    fallback: Vec<Activity>,
    created: Vec<Activity>,
    joined: Vec<Activity>,
    favorites: HashSet<ActivityId>,
    remote_cache: Vec<Activity>,
    statuses: HashMap<ActivityId, SyncStatus>,
    /// Ids deleted in this session; masked from the merged view.
    tombstones: HashSet<ActivityId>,
    /// Tombstoned ids whose remote delete went through.
    confirmed_deletes: HashSet<ActivityId>,
    queue: OperationQueue,
    in_flight: JoinSet<SyncOutcome>,
    utc_offset: FixedOffset,
}

impl ActivityStore {
    /// Create a store, restoring any collections saved by a previous run.
    pub fn new(backends: SyncBackends, fallback: Vec<Activity>) -> Self {
        let local = backends.local.as_ref();
        let created: Vec<Activity> = load_json(local, keys::CREATED_ACTIVITIES).unwrap_or_default();
        let joined: Vec<Activity> = load_json(local, keys::JOINED_ACTIVITIES).unwrap_or_default();
        let favorites: Vec<ActivityId> =
            load_json(local, keys::FAVORITE_ACTIVITY_IDS).unwrap_or_default();

        tracing::info!(
            created = created.len(),
            joined = joined.len(),
            favorites = favorites.len(),
            fallback = fallback.len(),
            "Activity store loaded"
        );

        Self {
            backends,
            fallback,
            created,
            joined,
            favorites: favorites.into_iter().collect(),
            remote_cache: Vec::new(),
            statuses: HashMap::new(),
            tombstones: HashSet::new(),
            confirmed_deletes: HashSet::new(),
            queue: OperationQueue::new(),
            in_flight: JoinSet::new(),
            utc_offset: Utc.fix(),
        }
    }

    /// Offset used for time-of-day filtering.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    // ─── Snapshots ───────────────────────────────────────────────

    pub fn created(&self) -> &[Activity] {
        &self.created
    }

    pub fn joined(&self) -> &[Activity] {
        &self.joined
    }

    pub fn favorites(&self) -> &HashSet<ActivityId> {
        &self.favorites
    }

    pub fn remote_cache(&self) -> &[Activity] {
        &self.remote_cache
    }

    pub fn is_joined(&self, id: &ActivityId) -> bool {
        self.joined.iter().any(|a| &a.id == id)
    }

    pub fn is_favorite(&self, id: &ActivityId) -> bool {
        self.favorites.contains(id)
    }

    /// Sync state of an activity. Activities only known from the last fetch
    /// count as synced.
    pub fn sync_status(&self, id: &ActivityId) -> Option<SyncStatus> {
        self.statuses.get(id).copied().or_else(|| {
            self.remote_cache
                .iter()
                .any(|a| &a.id == id)
                .then_some(SyncStatus::Synced)
        })
    }

    /// Number of remote operations not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// The merged, deduplicated activity set, without deleted ids.
    pub fn visible(&self) -> Vec<Activity> {
        let mut merged = merge(&MergeSources {
            remote_cache: &self.remote_cache,
            created: &self.created,
            joined: &self.joined,
            fallback: &self.fallback,
        });
        merged.retain(|a| !self.tombstones.contains(&a.id));
        merged
    }

    /// Look up a visible activity by id.
    pub fn get(&self, id: &ActivityId) -> Option<Activity> {
        self.visible().into_iter().find(|a| &a.id == id)
    }

    /// The visible set run through the filter pipeline.
    pub fn filtered(
        &self,
        config: &FilterConfiguration,
        reference: Option<geo::Point<f64>>,
    ) -> Vec<Activity> {
        let joined_ids: HashSet<ActivityId> = self.joined.iter().map(|a| a.id.clone()).collect();
        let ctx = FilterContext {
            joined: &joined_ids,
            favorites: &self.favorites,
            reference,
            utc_offset: self.utc_offset,
        };
        filter::apply(config, &ctx, self.visible())
    }

    // ─── Fetch ───────────────────────────────────────────────────

    /// Start a fetch-all without holding the store.
    ///
    /// Pass the result to [`ActivityStore::apply_fetch`] on the owner.
    pub fn begin_refresh(
        &self,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>>> + Send + 'static {
        let remote = self.backends.remote.clone();
        async move { remote.fetch_all().await }
    }

    /// Replace the remote cache with a fetch result.
    ///
    /// On failure the previous cache is kept.
    pub fn apply_fetch(&mut self, result: Result<Vec<serde_json::Value>>) -> Result<FetchReport> {
        let rows = match result {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    cached = self.remote_cache.len(),
                    "Fetch failed, keeping previous remote cache"
                );
                return Err(e);
            }
        };

        let batch = decode_batch(rows);
        let report = FetchReport {
            fetched: batch.activities.len(),
            dropped: batch.dropped,
        };
        self.remote_cache = batch.activities;
        self.prune_tombstones();

        tracing::info!(
            fetched = report.fetched,
            dropped = report.dropped,
            "Remote cache refreshed"
        );
        Ok(report)
    }

    /// Forget tombstones for ids that are deleted remotely and no longer fetched.
    fn prune_tombstones(&mut self) {
        let remote_cache = &self.remote_cache;
        let gone: Vec<ActivityId> = self
            .confirmed_deletes
            .iter()
            .filter(|id| !remote_cache.iter().any(|a| &a.id == *id))
            .cloned()
            .collect();

        for id in gone {
            self.confirmed_deletes.remove(&id);
            self.tombstones.remove(&id);
            self.statuses.remove(&id);
            tracing::debug!(activity_id = %id, "Tombstone dropped");
        }
    }

    /// Fetch all remote activities into the remote cache.
    pub async fn refresh(&mut self) -> Result<FetchReport> {
        let fetch = self.begin_refresh();
        let result = fetch.await;
        self.apply_fetch(result)
    }

    // ─── Mutations ───────────────────────────────────────────────

    /// Add a locally authored activity and join it.
    pub fn create(&mut self, activity: Activity) -> Result<()> {
        activity.validate()?;
        let id = activity.id.clone();

        self.tombstones.remove(&id);
        self.confirmed_deletes.remove(&id);
        match self.created.iter_mut().find(|a| a.id == id) {
            Some(existing) => *existing = activity.clone(),
            None => self.created.push(activity.clone()),
        }
        self.persist_created();
        self.join(activity.clone());

        tracing::info!(activity_id = %id, "Activity created locally");
        self.submit_write(activity, RemoteWrite::Insert);
        Ok(())
    }

    /// Replace an activity in place in the created and joined collections.
    pub fn update(&mut self, activity: Activity) -> Result<()> {
        activity.validate()?;
        let id = activity.id.clone();

        let in_created = replace_by_id(&mut self.created, &activity);
        let in_joined = replace_by_id(&mut self.joined, &activity);
        if !in_created && !in_joined {
            return Err(AppError::NotFound(format!("Activity {}", id)));
        }
        // Keep the cached copy in step so the merged view shows the edit now.
        replace_by_id(&mut self.remote_cache, &activity);

        if in_created {
            self.persist_created();
        }
        if in_joined {
            self.persist_joined();
        }

        tracing::info!(activity_id = %id, "Activity updated locally");
        self.submit_write(activity, RemoteWrite::Update);
        Ok(())
    }

    /// Remove an activity everywhere locally, then delete it remotely.
    ///
    /// The local removal is final even if the remote delete fails.
    pub fn delete(&mut self, id: &ActivityId) -> Result<()> {
        let removed_created = take_by_id(&mut self.created, id);
        let removed_joined = take_by_id(&mut self.joined, id);
        let removed = removed_joined
            .or(removed_created)
            .or_else(|| self.remote_cache.iter().find(|a| &a.id == id).cloned())
            .ok_or_else(|| AppError::NotFound(format!("Activity {}", id)))?;

        self.favorites.remove(id);
        self.persist_created();
        self.persist_joined();
        self.persist_favorites();

        self.tombstones.insert(id.clone());
        self.confirmed_deletes.remove(id);
        self.statuses.insert(id.clone(), SyncStatus::Deleted);
        self.backends.notifications.cancel_reminders(&removed);

        tracing::info!(activity_id = %id, "Activity deleted locally");
        self.submit_delete(id.clone());
        Ok(())
    }

    /// Join an activity. Joining twice is a no-op beyond re-persisting.
    pub fn join(&mut self, activity: Activity) {
        if self.is_joined(&activity.id) {
            tracing::debug!(activity_id = %activity.id, "Already joined");
        } else {
            self.backends.notifications.schedule_reminders(&activity);
            self.joined.push(activity);
        }
        self.persist_joined();
    }

    /// Leave an activity. Leaving one not joined is a no-op beyond re-persisting.
    pub fn leave(&mut self, id: &ActivityId) {
        match take_by_id(&mut self.joined, id) {
            Some(left) => self.backends.notifications.cancel_reminders(&left),
            None => tracing::debug!(activity_id = %id, "Not joined, nothing to leave"),
        }
        self.persist_joined();
    }

    /// Flip favorite membership; returns whether the id is now a favorite.
    pub fn toggle_favorite(&mut self, id: &ActivityId) -> bool {
        let now_favorite = if self.favorites.remove(id) {
            false
        } else {
            self.favorites.insert(id.clone());
            true
        };
        self.persist_favorites();
        now_favorite
    }

    // ─── Remote operations ───────────────────────────────────────

    fn submit_write(&mut self, activity: Activity, write: RemoteWrite) {
        let id = activity.id.clone();
        self.statuses.insert(id.clone(), SyncStatus::LocalOnly);

        let backends = self.backends.clone();
        let activity_id = id.clone();
        self.queue.submit(&mut self.in_flight, &id, move |seq| async move {
            let result = push_activity(&backends, activity, write).await;
            SyncOutcome {
                activity_id,
                seq,
                result: OutcomeResult::Written(result),
            }
        });
    }

    fn submit_delete(&mut self, id: ActivityId) {
        let backends = self.backends.clone();
        let activity_id = id.clone();
        self.queue.submit(&mut self.in_flight, &id, move |seq| async move {
            let result = remove_activity(&backends, &activity_id).await;
            SyncOutcome {
                activity_id,
                seq,
                result: OutcomeResult::Deleted(result),
            }
        });
    }

    /// Apply every remote outcome that has already finished. Never waits.
    pub fn poll_completed(&mut self) -> usize {
        let mut applied = 0;
        while let Some(joined) = self.in_flight.try_join_next() {
            self.handle_joined(joined);
            applied += 1;
        }
        if applied > 0 {
            tracing::debug!(
                applied,
                pending_activities = self.queue.pending_ids(),
                "Applied remote outcomes"
            );
        }
        applied
    }

    /// Wait for every in-flight remote operation and apply its outcome.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            self.handle_joined(joined);
        }
    }

    fn handle_joined(&mut self, joined: std::result::Result<SyncOutcome, JoinError>) {
        match joined {
            Ok(outcome) => self.apply_outcome(outcome),
            Err(e) => tracing::error!(error = %e, "Sync task failed"),
        }
    }

    fn apply_outcome(&mut self, outcome: SyncOutcome) {
        let SyncOutcome {
            activity_id: id,
            seq,
            result,
        } = outcome;
        let latest = self.queue.is_latest(&id, seq);
        let deleted = self.tombstones.contains(&id);

        match result {
            OutcomeResult::Written(Ok(uploaded)) => {
                tracing::debug!(activity_id = %id, seq, "Remote write confirmed");
                if latest && !deleted {
                    if let Some(url) = uploaded {
                        self.adopt_image_url(&id, &url);
                    }
                    self.statuses.insert(id.clone(), SyncStatus::Synced);
                }
            }
            OutcomeResult::Written(Err(e)) => {
                if e.is_network_error() {
                    tracing::warn!(
                        activity_id = %id,
                        error = %e,
                        "Remote write failed; keeping local changes"
                    );
                } else {
                    tracing::error!(
                        activity_id = %id,
                        error = %e,
                        "Activity could not be prepared for sync"
                    );
                }
                if latest && !deleted {
                    self.statuses.insert(id.clone(), SyncStatus::SyncFailed);
                }
            }
            OutcomeResult::Deleted(Ok(())) => {
                tracing::info!(activity_id = %id, "Remote delete confirmed");
                self.remote_cache.retain(|a| a.id != id);
                if latest && deleted {
                    self.confirmed_deletes.insert(id.clone());
                }
            }
            OutcomeResult::Deleted(Err(e)) => {
                tracing::warn!(
                    activity_id = %id,
                    error = %e,
                    "Remote delete failed; activity stays deleted locally"
                );
            }
        }

        self.queue.finish(&id, seq);
    }

    /// Swap an uploaded image's URL in for the embedded payload.
    fn adopt_image_url(&mut self, id: &ActivityId, url: &str) {
        let mut touched_created = false;
        for activity in self.created.iter_mut().filter(|a| &a.id == id) {
            activity.set_remote_image(url);
            touched_created = true;
        }
        let mut touched_joined = false;
        for activity in self.joined.iter_mut().filter(|a| &a.id == id) {
            activity.set_remote_image(url);
            touched_joined = true;
        }
        for activity in self.remote_cache.iter_mut().filter(|a| &a.id == id) {
            activity.set_remote_image(url);
        }

        if touched_created {
            self.persist_created();
        }
        if touched_joined {
            self.persist_joined();
        }
    }

    // ─── Persistence ─────────────────────────────────────────────

    fn persist_created(&self) {
        save_json(self.backends.local.as_ref(), keys::CREATED_ACTIVITIES, &self.created);
    }

    fn persist_joined(&self) {
        save_json(self.backends.local.as_ref(), keys::JOINED_ACTIVITIES, &self.joined);
    }

    fn persist_favorites(&self) {
        let mut ids: Vec<&ActivityId> = self.favorites.iter().collect();
        ids.sort();
        save_json(self.backends.local.as_ref(), keys::FAVORITE_ACTIVITY_IDS, &ids);
    }
}

/// Upload the embedded image (if any), then write the record.
async fn push_activity(
    backends: &SyncBackends,
    mut activity: Activity,
    write: RemoteWrite,
) -> Result<Option<String>> {
    let encoded = match activity.embedded_image() {
        Some(raw) => Some(backends.codec.compress(raw)?),
        None => None,
    };

    let mut uploaded = None;
    if let Some(encoded) = encoded {
        let path = image_object_path(activity.id.as_str());
        let url = backends
            .objects
            .upload(&path, encoded.bytes, encoded.content_type, true)
            .await?;
        activity.set_remote_image(url.clone());
        uploaded = Some(url);
    }

    let record = RemoteActivityRecord::try_from(&activity)?;
    match write {
        RemoteWrite::Insert => backends.remote.insert(&record).await?,
        RemoteWrite::Update => backends.remote.update_by_id(&record.id, &record).await?,
    }
    Ok(uploaded)
}

/// Delete the record, then best-effort remove its stored image.
async fn remove_activity(backends: &SyncBackends, id: &ActivityId) -> Result<()> {
    backends.remote.delete_by_id(id.as_str()).await?;

    let paths = vec![image_object_path(id.as_str())];
    if let Err(e) = backends.objects.remove(&paths).await {
        tracing::debug!(activity_id = %id, error = %e, "Image cleanup failed, ignoring");
    }
    Ok(())
}

/// Replace the entry with the same id in place; returns whether one existed.
fn replace_by_id(collection: &mut [Activity], activity: &Activity) -> bool {
    match collection.iter_mut().find(|a| a.id == activity.id) {
        Some(existing) => {
            *existing = activity.clone();
            true
        }
        None => false,
    }
}

/// Remove and return the entry with `id`, keeping the order of the rest.
fn take_by_id(collection: &mut Vec<Activity>, id: &ActivityId) -> Option<Activity> {
    let index = collection.iter().position(|a| &a.id == id)?;
    Some(collection.remove(index))
}
