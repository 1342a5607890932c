//! In-process backend used in offline mode and tests.
//!
//! Behaves like the hosted backend (unique ids on insert, update-by-id is a
//! no-op for unknown ids) and supports injected latency and failures.

use crate::db::{ObjectStorage, RemoteStore};
use crate::error::AppError;
use crate::models::{Activity, RemoteActivityRecord};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Backend calls, for latency/failure injection and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchAll,
    Insert,
    Update,
    Delete,
    Upload,
    Remove,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
struct Inner {
    rows: BTreeMap<String, serde_json::Value>,
    objects: BTreeMap<String, StoredObject>,
    delays: HashMap<Operation, VecDeque<Duration>>,
    failures: HashMap<Operation, usize>,
    offline: bool,
    calls: Vec<Operation>,
}

/// In-memory record store and object storage. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ─── Fixtures ────────────────────────────────────────────────

    /// Store a raw row as-is (may be malformed on purpose).
    pub fn seed_row(&self, row: serde_json::Value) {
        let id = row
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("row-{}", self.lock().rows.len()));
        self.lock().rows.insert(id, row);
    }

    /// Store an activity as its remote record.
    pub fn seed_activity(&self, activity: &Activity) -> Result<(), AppError> {
        let record = RemoteActivityRecord::try_from(activity)?;
        let value = serde_json::to_value(&record).map_err(anyhow::Error::from)?;
        self.lock().rows.insert(record.id, value);
        Ok(())
    }

    /// Drop a row directly, as if another client deleted it.
    pub fn remove_row(&self, id: &str) {
        self.lock().rows.remove(id);
    }

    // ─── Injection ───────────────────────────────────────────────

    /// Delay the next call of `op` by `delay`. Delays queue up per operation.
    pub fn delay_next(&self, op: Operation, delay: Duration) {
        self.lock().delays.entry(op).or_default().push_back(delay);
    }

    /// Fail the next `count` calls of `op`.
    pub fn fail_next(&self, op: Operation, count: usize) {
        *self.lock().failures.entry(op).or_default() += count;
    }

    /// Fail every call while offline.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    // ─── Inspection ──────────────────────────────────────────────

    pub fn row_count(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn record(&self, id: &str) -> Option<RemoteActivityRecord> {
        let row = self.lock().rows.get(id).cloned()?;
        RemoteActivityRecord::from_value(row).ok()
    }

    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.lock().objects.get(path).cloned()
    }

    /// Every call made so far, in the order calls started.
    pub fn calls(&self) -> Vec<Operation> {
        self.lock().calls.clone()
    }

    pub fn public_url(path: &str) -> String {
        format!("memory://objects/{path}")
    }

    /// Record the call, then apply any injected latency and failure.
    async fn begin(&self, op: Operation) -> Result<(), AppError> {
        let (delay, fail) = {
            let mut inner = self.lock();
            inner.calls.push(op);
            let delay = inner.delays.get_mut(&op).and_then(VecDeque::pop_front);
            let fail = inner.offline
                || match inner.failures.get_mut(&op) {
                    Some(remaining) if *remaining > 0 => {
                        *remaining -= 1;
                        true
                    }
                    _ => false,
                };
            (delay, fail)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if fail {
            let message = format!("injected failure for {:?}", op);
            return Err(match op {
                Operation::Upload | Operation::Remove => AppError::ObjectStorage(message),
                _ => AppError::Remote(message),
            });
        }
        Ok(())
    }
}

impl RemoteStore for MemoryBackend {
    fn fetch_all(&self) -> BoxFuture<'_, Result<Vec<serde_json::Value>, AppError>> {
        async move {
            self.begin(Operation::FetchAll).await?;
            Ok(self.lock().rows.values().cloned().collect())
        }
        .boxed()
    }

    fn insert<'a>(&'a self, record: &'a RemoteActivityRecord) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            self.begin(Operation::Insert).await?;
            let value = serde_json::to_value(record).map_err(anyhow::Error::from)?;
            let mut inner = self.lock();
            if inner.rows.contains_key(&record.id) {
                return Err(AppError::Remote(format!(
                    "duplicate key value violates unique constraint: {}",
                    record.id
                )));
            }
            inner.rows.insert(record.id.clone(), value);
            Ok(())
        }
        .boxed()
    }

    fn update_by_id<'a>(
        &'a self,
        id: &'a str,
        record: &'a RemoteActivityRecord,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            self.begin(Operation::Update).await?;
            let value = serde_json::to_value(record).map_err(anyhow::Error::from)?;
            if let Some(row) = self.lock().rows.get_mut(id) {
                *row = value;
            }
            Ok(())
        }
        .boxed()
    }

    fn delete_by_id<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            self.begin(Operation::Delete).await?;
            self.lock().rows.remove(id);
            Ok(())
        }
        .boxed()
    }
}

impl ObjectStorage for MemoryBackend {
    fn upload<'a>(
        &'a self,
        path: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
        overwrite: bool,
    ) -> BoxFuture<'a, Result<String, AppError>> {
        async move {
            self.begin(Operation::Upload).await?;
            let mut inner = self.lock();
            if !overwrite && inner.objects.contains_key(path) {
                return Err(AppError::ObjectStorage(format!(
                    "object already exists: {path}"
                )));
            }
            inner.objects.insert(
                path.to_string(),
                StoredObject {
                    bytes,
                    content_type: content_type.to_string(),
                },
            );
            Ok(Self::public_url(path))
        }
        .boxed()
    }

    fn remove<'a>(&'a self, paths: &'a [String]) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            self.begin(Operation::Remove).await?;
            let mut inner = self.lock();
            for path in paths {
                inner.objects.remove(path);
            }
            Ok(())
        }
        .boxed()
    }
}
