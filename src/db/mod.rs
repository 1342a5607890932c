//! Remote backend layer (record store + object storage).

pub mod memory;
pub mod rest;

pub use memory::MemoryBackend;
pub use rest::RestBackend;

use crate::error::AppError;
use crate::models::RemoteActivityRecord;
use futures_util::future::BoxFuture;

/// Table names as constants.
pub mod tables {
    pub const ACTIVITIES: &str = "activities";
}

/// Object storage path for an activity's image.
///
/// Derived only from the id, so re-uploads overwrite the same object.
pub fn image_object_path(activity_id: &str) -> String {
    format!("activities/{activity_id}")
}

/// The hosted record store that is the system of record for activities.
///
/// `fetch_all` returns raw rows so that one malformed row cannot fail the
/// whole batch; conversion happens in the caller.
pub trait RemoteStore: Send + Sync {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<serde_json::Value>, AppError>>;

    fn insert<'a>(&'a self, record: &'a RemoteActivityRecord) -> BoxFuture<'a, Result<(), AppError>>;

    fn update_by_id<'a>(
        &'a self,
        id: &'a str,
        record: &'a RemoteActivityRecord,
    ) -> BoxFuture<'a, Result<(), AppError>>;

    fn delete_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), AppError>>;
}

/// Blob storage for activity images.
pub trait ObjectStorage: Send + Sync {
    /// Upload `bytes` to `path` and return the object's public URL.
    fn upload<'a>(
        &'a self,
        path: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
        overwrite: bool,
    ) -> BoxFuture<'a, Result<String, AppError>>;

    fn remove<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, Result<(), AppError>>;
}
