// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod filter;
pub mod sync;
pub mod user;

pub use activity::{Activity, ActivityId, ActivityImage, Category, RemoteActivityRecord, Rgb};
pub use filter::{FilterConfiguration, Participation, SortDirection, SortKey};
pub use sync::SyncStatus;
pub use user::{Avatar, Credentials, Gender, UserProfile};

/// Serde helper storing raw bytes as standard base64 strings.
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}
