// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity Sync: offline-first activity store with remote sync
//!
//! This crate keeps a local set of activities (created, joined, favorites),
//! mirrors mutations to a hosted record store and object storage, and
//! exposes a merged, filterable view to a UI shell over HTTP.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod persistence;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use models::FilterConfiguration;
use persistence::{keys, load_json, LocalStore};
use services::{ActivityStore, CalendarBridge, ProfileService};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state.
///
/// The activity store has a single owner at a time through its mutex.
pub struct AppState {
    pub config: Config,
    pub store: Mutex<ActivityStore>,
    pub profiles: Mutex<ProfileService>,
    pub filter: Mutex<FilterConfiguration>,
    pub local: Arc<dyn LocalStore>,
    pub calendar: Arc<dyn CalendarBridge>,
}

impl AppState {
    /// Assemble the state, restoring the saved profile and filter settings.
    pub fn new(
        config: Config,
        store: ActivityStore,
        local: Arc<dyn LocalStore>,
        calendar: Arc<dyn CalendarBridge>,
    ) -> Self {
        let profiles = ProfileService::load(local.clone());
        let filter: FilterConfiguration =
            load_json(local.as_ref(), keys::FILTER_CONFIGURATION).unwrap_or_default();

        Self {
            config,
            store: Mutex::new(store),
            profiles: Mutex::new(profiles),
            filter: Mutex::new(filter),
            local,
            calendar,
        }
    }
}
