// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity model for local storage and the remote transport format.

use crate::models::base64_bytes;
use crate::time_utils::{from_epoch_seconds, to_epoch_seconds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use validator::Validate;

/// Opaque activity identifier, stable across local and remote copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id for a locally authored activity.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ActivityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Activity category.
///
/// The set is open: categories this build does not know about are kept
/// verbatim in `Other` so they round-trip unchanged. Known names match
/// case-insensitively and are always written back in lowercase, so a remote
/// `"Sport"` is re-sent as `"sport"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Sport,
    Music,
    Food,
    Art,
    Outdoors,
    Social,
    Learning,
    Games,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Sport => "sport",
            Category::Music => "music",
            Category::Food => "food",
            Category::Art => "art",
            Category::Outdoors => "outdoors",
            Category::Social => "social",
            Category::Learning => "learning",
            Category::Games => "games",
            Category::Other(name) => name,
        }
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        match name.trim().to_lowercase().as_str() {
            "sport" => Category::Sport,
            "music" => Category::Music,
            "food" => Category::Food,
            "art" => Category::Art,
            "outdoors" => Category::Outdoors,
            "social" => Category::Social,
            "learning" => Category::Learning,
            "games" => Category::Games,
            _ => Category::Other(name),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Rgb {
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self {
            red: clamp_component(red),
            green: clamp_component(green),
            blue: clamp_component(blue),
        }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::new(0.0, 0.478, 1.0)
    }
}

fn clamp_component(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// The authoritative image of an activity: either raw bytes awaiting upload
/// or a reference to the uploaded object, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActivityImage {
    Embedded(#[serde(with = "base64_bytes")] Vec<u8>),
    Remote(String),
}

/// A user-visible event with schedule, location and category.
///
/// Equality and hashing use the id only, so two copies of the same activity
/// from different sources compare equal regardless of content.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Activity {
    pub id: ActivityId,
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    pub scheduled_at: DateTime<Utc>,
    pub location_name: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(default)]
    pub color: Rgb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ActivityImage>,
}

impl PartialEq for Activity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Activity {}

impl Hash for Activity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Activity {
    /// Image bytes still waiting to be uploaded, if any.
    pub fn embedded_image(&self) -> Option<&[u8]> {
        match &self.image {
            Some(ActivityImage::Embedded(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Public URL of the uploaded image, if any.
    pub fn image_url(&self) -> Option<&str> {
        match &self.image {
            Some(ActivityImage::Remote(url)) => Some(url),
            _ => None,
        }
    }

    /// Replace any embedded payload with the uploaded object's URL.
    pub fn set_remote_image(&mut self, url: impl Into<String>) {
        self.image = Some(ActivityImage::Remote(url.into()));
    }

    /// Activity location as a `geo` point (x = longitude, y = latitude).
    pub fn location(&self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

// ─── Remote transport ────────────────────────────────────────────────────────

/// Activity row as stored by the hosted backend.
///
/// Flattened, snake_case fields with the schedule as epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteActivityRecord {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Scheduled start (epoch seconds)
    pub date: f64,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub color_red: f64,
    pub color_green: f64,
    pub color_blue: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Errors converting between local and remote representations.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Malformed remote record: {0}")]
    Malformed(String),

    #[error("Invalid date value: {0}")]
    InvalidDate(f64),

    #[error("Invalid coordinates: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Activity {0} still carries an embedded image; upload it first")]
    EmbeddedImage(ActivityId),
}

impl RemoteActivityRecord {
    /// Decode a single raw row from the remote store.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConversionError> {
        serde_json::from_value(value).map_err(|e| ConversionError::Malformed(e.to_string()))
    }
}

impl TryFrom<&Activity> for RemoteActivityRecord {
    type Error = ConversionError;

    fn try_from(activity: &Activity) -> Result<Self, Self::Error> {
        let image_url = match &activity.image {
            Some(ActivityImage::Embedded(_)) => {
                return Err(ConversionError::EmbeddedImage(activity.id.clone()))
            }
            Some(ActivityImage::Remote(url)) => Some(url.clone()),
            None => None,
        };

        Ok(Self {
            id: activity.id.to_string(),
            title: activity.title.clone(),
            category: activity.category.to_string(),
            description: activity.description.clone(),
            date: to_epoch_seconds(activity.scheduled_at),
            location_name: activity.location_name.clone(),
            latitude: activity.latitude,
            longitude: activity.longitude,
            color_red: activity.color.red,
            color_green: activity.color.green,
            color_blue: activity.color.blue,
            image_url,
        })
    }
}

impl TryFrom<RemoteActivityRecord> for Activity {
    type Error = ConversionError;

    fn try_from(record: RemoteActivityRecord) -> Result<Self, Self::Error> {
        let scheduled_at =
            from_epoch_seconds(record.date).ok_or(ConversionError::InvalidDate(record.date))?;

        let valid_coordinates = (-90.0..=90.0).contains(&record.latitude)
            && (-180.0..=180.0).contains(&record.longitude);
        if !valid_coordinates {
            return Err(ConversionError::InvalidCoordinates {
                latitude: record.latitude,
                longitude: record.longitude,
            });
        }

        Ok(Self {
            id: ActivityId::new(record.id),
            title: record.title,
            category: Category::from(record.category),
            description: record.description,
            scheduled_at,
            location_name: record.location_name,
            latitude: record.latitude,
            longitude: record.longitude,
            color: Rgb::new(record.color_red, record.color_green, record.color_blue),
            image: record
                .image_url
                .filter(|url| !url.is_empty())
                .map(ActivityImage::Remote),
        })
    }
}

/// Result of converting a batch of remote rows.
#[derive(Debug, Default)]
pub struct ActivityBatch {
    pub activities: Vec<Activity>,
    /// Rows that failed conversion and were skipped.
    pub dropped: usize,
}

/// Convert raw remote rows, skipping (and counting) the malformed ones.
pub fn decode_batch(rows: Vec<serde_json::Value>) -> ActivityBatch {
    let mut batch = ActivityBatch::default();

    for row in rows {
        let converted = RemoteActivityRecord::from_value(row).and_then(Activity::try_from);
        match converted {
            Ok(activity) => batch.activities.push(activity),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed remote activity");
                batch.dropped += 1;
            }
        }
    }

    batch
}
