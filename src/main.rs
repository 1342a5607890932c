// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity Sync API Server
//!
//! Serves the local activity store to a UI shell and keeps it in sync with
//! the hosted backend.

use activity_sync::{
    config::Config,
    db::{MemoryBackend, ObjectStorage, RemoteStore, RestBackend},
    persistence::FileStore,
    services::{ActivityStore, FallbackCatalog, JpegCodec, SyncBackends, TracingBridge},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Activity Sync API");

    // Remote backend: hosted when configured, in-memory otherwise
    let (remote, objects): (Arc<dyn RemoteStore>, Arc<dyn ObjectStorage>) = match &config.remote
    {
        Some(remote) => {
            let backend = Arc::new(RestBackend::new(
                &remote.url,
                remote.api_key.clone(),
                config.activities_table.clone(),
                config.storage_bucket.clone(),
            ));
            tracing::info!(url = %remote.url, "Using hosted backend");
            (backend.clone(), backend)
        }
        None => {
            let backend = Arc::new(MemoryBackend::new());
            tracing::warn!("REMOTE_URL not set, using in-memory backend");
            (backend.clone(), backend)
        }
    };

    // Device-local persistence
    let local = Arc::new(FileStore::open(&config.data_dir).expect("Failed to open data dir"));
    tracing::info!(path = %config.data_dir.display(), "Local store opened");

    // Built-in defaults; missing file just means none
    let fallback = match FallbackCatalog::load_from_file(&config.fallback_path) {
        Ok(catalog) => catalog.into_activities(),
        Err(e) => {
            tracing::warn!(
                path = %config.fallback_path.display(),
                error = %e,
                "No fallback activities"
            );
            Vec::new()
        }
    };

    let bridge = Arc::new(TracingBridge);
    let backends = SyncBackends {
        remote,
        objects,
        local: local.clone(),
        notifications: bridge.clone(),
        codec: Arc::new(JpegCodec::new(config.max_image_bytes)),
    };
    let mut store = ActivityStore::new(backends, fallback).with_utc_offset(config.utc_offset());

    // Initial fetch; failure leaves the local view usable
    if let Err(e) = store.refresh().await {
        tracing::warn!(error = %e, "Initial fetch failed, starting from local data");
    }

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), store, local, bridge));

    // Build router
    let app = activity_sync::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("activity_sync=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
