// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Built-in default activities shown when nothing else is available.

use crate::models::Activity;
use std::fs;
use std::path::Path;

/// Fallback activities, lowest priority in the merged view.
#[derive(Debug, Default, Clone)]
pub struct FallbackCatalog {
    activities: Vec<Activity>,
}

impl FallbackCatalog {
    /// Load fallback activities from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, FallbackError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| FallbackError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load fallback activities from a JSON array of activities.
    pub fn load_from_json(json_data: &str) -> Result<Self, FallbackError> {
        let activities: Vec<Activity> = serde_json::from_str(json_data)
            .map_err(|e| FallbackError::ParseError(e.to_string()))?;

        if let Some(bad) = activities.iter().find(|a| a.embedded_image().is_some()) {
            return Err(FallbackError::EmbeddedImage(bad.id.to_string()));
        }

        tracing::info!(count = activities.len(), "Loaded fallback activities");
        Ok(Self { activities })
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn into_activities(self) -> Vec<Activity> {
        self.activities
    }
}

/// Errors from loading the fallback catalog.
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse fallback activities: {0}")]
    ParseError(String),

    #[error("Fallback activity {0} must not embed an image")]
    EmbeddedImage(String),
}
