// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use activity_sync::config::Config;
use activity_sync::db::MemoryBackend;
use activity_sync::error::AppError;
use activity_sync::models::{Activity, ActivityId, Category, Rgb};
use activity_sync::persistence::MemoryStore;
use activity_sync::routes::create_router;
use activity_sync::services::{
    ActivityStore, CalendarBridge, JpegCodec, NotificationBridge, SyncBackends,
};
use activity_sync::AppState;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

/// Bridge call, as recorded by `RecordingBridge`.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    Schedule(String),
    Cancel(String),
    AddEvent(String),
    RemoveEvent(String),
}

/// Notification and calendar bridge that remembers every call.
#[derive(Default)]
pub struct RecordingBridge {
    calls: Mutex<Vec<BridgeCall>>,
}

#[allow(dead_code)]
impl RecordingBridge {
    pub fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: BridgeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl NotificationBridge for RecordingBridge {
    fn schedule_reminders(&self, activity: &Activity) {
        self.record(BridgeCall::Schedule(activity.id.to_string()));
    }

    fn cancel_reminders(&self, activity: &Activity) {
        self.record(BridgeCall::Cancel(activity.id.to_string()));
    }
}

impl CalendarBridge for RecordingBridge {
    fn add_event(&self, activity: &Activity) -> Result<(), AppError> {
        self.record(BridgeCall::AddEvent(activity.id.to_string()));
        Ok(())
    }

    fn remove_event(&self, activity: &Activity) -> Result<(), AppError> {
        self.record(BridgeCall::RemoveEvent(activity.id.to_string()));
        Ok(())
    }
}

/// A store wired to in-memory collaborators the test can inspect.
#[allow(dead_code)]
pub struct TestStore {
    pub store: ActivityStore,
    pub remote: MemoryBackend,
    pub local: MemoryStore,
    pub bridge: Arc<RecordingBridge>,
}

#[allow(dead_code)]
impl TestStore {
    /// Build a second store over the same local and remote state, as after
    /// a restart.
    pub fn reopen(&self) -> ActivityStore {
        build_store(&self.remote, &self.local, self.bridge.clone(), Vec::new())
    }
}

fn build_store(
    remote: &MemoryBackend,
    local: &MemoryStore,
    bridge: Arc<RecordingBridge>,
    fallback: Vec<Activity>,
) -> ActivityStore {
    let backends = SyncBackends {
        remote: Arc::new(remote.clone()),
        objects: Arc::new(remote.clone()),
        local: Arc::new(local.clone()),
        notifications: bridge,
        codec: Arc::new(JpegCodec::new(1024 * 1024)),
    };
    ActivityStore::new(backends, fallback)
}

/// Create a store with empty in-memory backends.
#[allow(dead_code)]
pub fn test_store() -> TestStore {
    test_store_with_fallback(Vec::new())
}

#[allow(dead_code)]
pub fn test_store_with_fallback(fallback: Vec<Activity>) -> TestStore {
    let remote = MemoryBackend::new();
    let local = MemoryStore::new();
    let bridge = Arc::new(RecordingBridge::default());
    let store = build_store(&remote, &local, bridge.clone(), fallback);
    TestStore {
        store,
        remote,
        local,
        bridge,
    }
}

#[allow(dead_code)]
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// A valid activity with no image, at the origin.
#[allow(dead_code)]
pub fn sample_activity(id: &str, title: &str) -> Activity {
    Activity {
        id: ActivityId::new(id),
        title: title.to_string(),
        category: Category::Social,
        description: "A test activity".to_string(),
        scheduled_at: at(2025, 1, 15, 18),
        location_name: "Community Hall".to_string(),
        latitude: 0.0,
        longitude: 0.0,
        color: Rgb::new(0.5, 0.5, 0.5),
        image: None,
    }
}

/// A solid-color PNG of the given size.
#[allow(dead_code)]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([30, 120, 200]));
    let mut out = std::io::Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Create a test app with offline in-memory dependencies.
/// Returns the router, the shared state and the in-memory backend.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryBackend) {
    let config = Config::test_default();
    let remote = MemoryBackend::new();
    let local = MemoryStore::new();
    let bridge = Arc::new(RecordingBridge::default());
    let store = build_store(&remote, &local, bridge.clone(), Vec::new());

    let state = Arc::new(AppState::new(config, store, Arc::new(local), bridge));
    (create_router(state.clone()), state, remote)
}
