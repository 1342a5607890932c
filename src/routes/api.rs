// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the UI shell.

use crate::error::{AppError, Result};
use crate::models::{
    Activity, ActivityId, ActivityImage, Category, FilterConfiguration, Rgb, SyncStatus,
    UserProfile,
};
use crate::persistence::{keys, save_json};
use crate::services::filter::distance_km;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", get(list_activities).post(create_activity))
        .route(
            "/api/activities/{id}",
            put(update_activity).delete(delete_activity),
        )
        .route(
            "/api/activities/{id}/join",
            post(join_activity).delete(leave_activity),
        )
        .route("/api/activities/{id}/favorite", post(toggle_favorite))
        .route(
            "/api/activities/{id}/calendar",
            post(add_to_calendar).delete(remove_from_calendar),
        )
        .route("/api/filter", get(get_filter).put(put_filter))
        .route("/api/sync/refresh", post(refresh))
        .route(
            "/api/profile",
            get(get_profile).put(put_profile).delete(sign_out),
        )
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ActivitiesQuery {
    /// Reference latitude for distance filtering
    lat: Option<f64>,
    /// Reference longitude for distance filtering
    lon: Option<f64>,
}

impl ActivitiesQuery {
    fn reference(&self) -> Result<Option<geo::Point<f64>>> {
        match (self.lat, self.lon) {
            (None, None) => Ok(None),
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(AppError::BadRequest(format!(
                        "Reference location out of range: ({lat}, {lon})"
                    )));
                }
                Ok(Some(geo::Point::new(lon, lat)))
            }
            _ => Err(AppError::BadRequest(
                "lat and lon must be given together".to_string(),
            )),
        }
    }
}

/// An activity as shown in the list, with the user's relation to it.
#[derive(Serialize)]
pub struct ActivityView {
    #[serde(flatten)]
    pub activity: Activity,
    pub joined: bool,
    pub favorite: bool,
    pub sync_status: Option<SyncStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

#[derive(Serialize)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivityView>,
    pub total: usize,
}

/// Activity fields as sent by the UI; the id is optional on create.
#[derive(Deserialize)]
struct ActivityPayload {
    #[serde(default)]
    id: Option<ActivityId>,
    title: String,
    category: Category,
    #[serde(default)]
    description: String,
    scheduled_at: DateTime<Utc>,
    location_name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    color: Rgb,
    #[serde(default)]
    image: Option<ActivityImage>,
}

impl ActivityPayload {
    fn into_activity(self, id: ActivityId) -> Activity {
        Activity {
            id,
            title: self.title,
            category: self.category,
            description: self.description,
            scheduled_at: self.scheduled_at,
            location_name: self.location_name,
            latitude: self.latitude,
            longitude: self.longitude,
            color: self.color,
            image: self.image,
        }
    }
}

/// List visible activities through the saved filter.
async fn list_activities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivitiesQuery>,
) -> Result<Json<ActivitiesResponse>> {
    let mut reference = params.reference()?;

    // Distances only from users who share their location
    if let Some(profile) = state.profiles.lock().await.current() {
        if !profile.share_location {
            reference = None;
        }
    }

    let config = state.filter.lock().await.clone();
    let mut store = state.store.lock().await;
    store.poll_completed();

    let activities: Vec<ActivityView> = store
        .filtered(&config, reference)
        .into_iter()
        .map(|activity| ActivityView {
            joined: store.is_joined(&activity.id),
            favorite: store.is_favorite(&activity.id),
            sync_status: store.sync_status(&activity.id),
            distance_km: reference.map(|r| distance_km(r, activity.location())),
            activity,
        })
        .collect();

    Ok(Json(ActivitiesResponse {
        total: activities.len(),
        activities,
    }))
}

async fn create_activity(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ActivityPayload>,
) -> Result<(StatusCode, Json<Activity>)> {
    let id = payload.id.clone().unwrap_or_else(ActivityId::generate);
    let activity = payload.into_activity(id);

    let mut store = state.store.lock().await;
    store.poll_completed();
    store.create(activity.clone())?;

    Ok((StatusCode::CREATED, Json(activity)))
}

async fn update_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ActivityPayload>,
) -> Result<Json<Activity>> {
    if payload.id.as_ref().is_some_and(|body_id| body_id.as_str() != id) {
        return Err(AppError::BadRequest(
            "Activity id in body does not match path".to_string(),
        ));
    }
    let activity = payload.into_activity(ActivityId::new(id));

    let mut store = state.store.lock().await;
    store.poll_completed();
    store.update(activity.clone())?;

    Ok(Json(activity))
}

async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let mut store = state.store.lock().await;
    store.poll_completed();
    store.delete(&ActivityId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Membership ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MembershipResponse {
    pub activity_id: String,
    pub joined: bool,
    pub favorite: bool,
}

async fn join_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MembershipResponse>> {
    let id = ActivityId::new(id);
    let mut store = state.store.lock().await;
    let activity = store
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Activity {}", id)))?;
    store.join(activity);

    Ok(Json(membership(&store, &id)))
}

async fn leave_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MembershipResponse>> {
    let id = ActivityId::new(id);
    let mut store = state.store.lock().await;
    store.leave(&id);

    Ok(Json(membership(&store, &id)))
}

async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MembershipResponse>> {
    let id = ActivityId::new(id);
    let mut store = state.store.lock().await;
    store.toggle_favorite(&id);

    Ok(Json(membership(&store, &id)))
}

fn membership(store: &crate::services::ActivityStore, id: &ActivityId) -> MembershipResponse {
    MembershipResponse {
        activity_id: id.to_string(),
        joined: store.is_joined(id),
        favorite: store.is_favorite(id),
    }
}

// ─── Calendar ────────────────────────────────────────────────

async fn add_to_calendar(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let activity = visible_activity(&state, id).await?;
    state.calendar.add_event(&activity)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_from_calendar(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let activity = visible_activity(&state, id).await?;
    state.calendar.remove_event(&activity)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn visible_activity(state: &AppState, id: String) -> Result<Activity> {
    let id = ActivityId::new(id);
    state
        .store
        .lock()
        .await
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Activity {}", id)))
}

// ─── Filter ──────────────────────────────────────────────────

async fn get_filter(State(state): State<Arc<AppState>>) -> Json<FilterConfiguration> {
    Json(state.filter.lock().await.clone())
}

async fn put_filter(
    State(state): State<Arc<AppState>>,
    Json(config): Json<FilterConfiguration>,
) -> Result<Json<FilterConfiguration>> {
    if let Some(&max_km) = config.max_distance_km.active() {
        if !max_km.is_finite() || max_km < 0.0 {
            return Err(AppError::BadRequest(format!(
                "Invalid distance radius: {max_km}"
            )));
        }
    }

    let mut current = state.filter.lock().await;
    *current = config;
    save_json(state.local.as_ref(), keys::FILTER_CONFIGURATION, &*current);

    Ok(Json(current.clone()))
}

// ─── Sync ────────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RefreshResponse {
    pub fetched: usize,
    pub dropped: usize,
    pub pending: usize,
}

/// Fetch all remote activities. The store stays available during the fetch.
async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<RefreshResponse>> {
    let fetch = state.store.lock().await.begin_refresh();
    let result = fetch.await;

    let mut store = state.store.lock().await;
    store.poll_completed();
    let report = store.apply_fetch(result)?;

    Ok(Json(RefreshResponse {
        fetched: report.fetched,
        dropped: report.dropped,
        pending: store.in_flight(),
    }))
}

// ─── Profile ─────────────────────────────────────────────────

async fn get_profile(State(state): State<Arc<AppState>>) -> Result<Json<UserProfile>> {
    state
        .profiles
        .lock()
        .await
        .current()
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No current profile".to_string()))
}

/// Register a profile, or replace the current one.
async fn put_profile(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<UserProfile>,
) -> Result<Json<UserProfile>> {
    let mut profiles = state.profiles.lock().await;
    let saved = if profiles.current().is_some() {
        profiles.replace(profile)?
    } else {
        profiles.register(profile)?
    };
    Ok(Json(saved.clone()))
}

async fn sign_out(State(state): State<Arc<AppState>>) -> StatusCode {
    state.profiles.lock().await.sign_out();
    StatusCode::NO_CONTENT
}
