//! Application configuration loaded from environment variables.
//!
//! Without `REMOTE_URL` the service runs fully offline against the
//! in-memory backend.

use std::env;
use std::path::PathBuf;

const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Hosted backend location and credentials.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the hosted backend
    pub url: String,
    /// API key sent with every request
    pub api_key: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hosted backend; `None` selects the in-memory backend
    pub remote: Option<RemoteConfig>,
    /// Table holding activity records
    pub activities_table: String,
    /// Object storage bucket for activity images
    pub storage_bucket: String,
    /// Directory for device-local persistence
    pub data_dir: PathBuf,
    /// JSON file with the built-in default activities
    pub fallback_path: PathBuf,
    /// Server port
    pub port: u16,
    /// Largest accepted image payload
    pub max_image_bytes: usize,
    /// Local UTC offset for time-of-day filtering, in minutes east of UTC
    pub utc_offset_minutes: i32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let remote = match env::var("REMOTE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(RemoteConfig {
                url: url.trim().trim_end_matches('/').to_string(),
                api_key: env::var("REMOTE_API_KEY")
                    .map(|v| v.trim().to_string())
                    .map_err(|_| ConfigError::Missing("REMOTE_API_KEY"))?,
            }),
            _ => None,
        };

        Ok(Self {
            remote,
            activities_table: env::var("ACTIVITIES_TABLE")
                .unwrap_or_else(|_| crate::db::tables::ACTIVITIES.to_string()),
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "activity-images".to_string()),
            data_dir: env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data/local".to_string())
                .into(),
            fallback_path: env::var("FALLBACK_PATH")
                .unwrap_or_else(|_| "data/fallback_activities.json".to_string())
                .into(),
            port: parse_var("PORT", 8080)?,
            max_image_bytes: parse_var("MAX_IMAGE_BYTES", DEFAULT_MAX_IMAGE_BYTES)?,
            utc_offset_minutes: parse_var("UTC_OFFSET_MINUTES", 0)?,
        })
    }

    /// Deterministic configuration for tests: offline, nothing on disk.
    pub fn test_default() -> Self {
        Self {
            remote: None,
            activities_table: crate::db::tables::ACTIVITIES.to_string(),
            storage_bucket: "test-images".to_string(),
            data_dir: PathBuf::from("./target/test-data"),
            fallback_path: PathBuf::from("data/fallback_activities.json"),
            port: 8080,
            max_image_bytes: 1024 * 1024,
            utc_offset_minutes: 0,
        }
    }

    /// The configured offset as a chrono offset, falling back to UTC when
    /// out of range.
    pub fn utc_offset(&self) -> chrono::FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(chrono::FixedOffset::east_opt)
            .unwrap_or_else(|| chrono::Offset::fix(&chrono::Utc))
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, value)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
