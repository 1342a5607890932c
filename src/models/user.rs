//! User profile model for local storage and API.

use crate::models::base64_bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// The current user's profile, stored locally.
///
/// Profiles are replaced wholesale on edit; there is no per-field diffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserProfile {
    /// Local profile ID (UUID)
    pub id: String,
    /// First name
    #[validate(length(min = 1, max = 60))]
    pub name: String,
    /// Last name
    #[serde(default)]
    pub surname: String,
    #[validate(range(min = 13, max = 120))]
    pub age: u8,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub bio: String,
    #[serde(default)]
    pub motto: String,
    pub avatar: Avatar,
    /// Login credentials (kept locally for the demo flow, not secured)
    #[validate(nested)]
    pub credentials: Credentials,
    /// Interest tags
    #[serde(default)]
    pub interests: BTreeSet<String>,
    /// Whether the user allows distance filtering from their location
    #[serde(default)]
    pub share_location: bool,
    /// Whether activity reminders may be scheduled
    #[serde(default)]
    pub notifications_enabled: bool,
    /// Preferred search radius (kilometers)
    #[validate(range(min = 1.0, max = 500.0))]
    pub max_distance_km: f64,
}

impl UserProfile {
    /// Generate an ID for a profile created at registration.
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    NonBinary,
    #[default]
    Unspecified,
}

/// Profile avatar: a named built-in icon or a user-supplied image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Avatar {
    Icon(String),
    Image(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl Default for Avatar {
    fn default() -> Self {
        Avatar::Icon("person.circle".to_string())
    }
}
