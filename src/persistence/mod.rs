// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device-local key-value persistence.
//!
//! Values are opaque bytes; the typed helpers below store JSON and treat
//! anything unreadable as "no saved value" so a corrupt file never prevents
//! startup.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::{de::DeserializeOwned, Serialize};

/// Key names as constants.
pub mod keys {
    pub const CREATED_ACTIVITIES: &str = "created_activities";
    pub const JOINED_ACTIVITIES: &str = "joined_activities";
    pub const FAVORITE_ACTIVITY_IDS: &str = "favorite_activity_ids";
    pub const CURRENT_USER: &str = "current_user";
    pub const FILTER_CONFIGURATION: &str = "filter_configuration";
}

/// Errors from the local store.
#[derive(Debug, thiserror::Error)]
pub enum LocalStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Durable byte store keyed by name.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LocalStoreError>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), LocalStoreError>;
    fn remove(&self, key: &str) -> Result<(), LocalStoreError>;
}

/// Load a JSON value, returning `None` when missing or unreadable.
pub fn load_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Option<T> {
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read local value, using default");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to decode local value, using default");
            None
        }
    }
}

/// Store a JSON value. Failures are logged and otherwise ignored.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn LocalStore, key: &str, value: &T) {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to encode local value");
            return;
        }
    };

    if let Err(e) = store.set(key, &bytes) {
        tracing::warn!(key, error = %e, "Failed to write local value");
    }
}

/// Remove a key. Failures are logged and otherwise ignored.
pub fn remove_key(store: &dyn LocalStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!(key, error = %e, "Failed to remove local value");
    }
}
