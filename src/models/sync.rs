//! Per-activity synchronization state.

use serde::{Deserialize, Serialize};

/// Where an activity stands relative to the remote store.
///
/// Local changes are applied optimistically and never rolled back, so a
/// `SyncFailed` activity stays visible with its local data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Changed locally, remote write not yet confirmed
    LocalOnly,
    /// Last remote write succeeded
    Synced,
    /// Last remote write failed; local and remote may differ
    SyncFailed,
    /// Removed locally (terminal, whatever the remote outcome)
    Deleted,
}
