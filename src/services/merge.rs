//! Deduplication of activities arriving from several sources.

use crate::models::{Activity, ActivityId};
use std::collections::HashSet;

/// The collections that make up the visible activity set.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeSources<'a> {
    /// Last successful full fetch (freshest authoritative copy)
    pub remote_cache: &'a [Activity],
    /// Activities authored on this device
    pub created: &'a [Activity],
    /// Activities the user joined
    pub joined: &'a [Activity],
    /// Built-in defaults
    pub fallback: &'a [Activity],
}

/// Collapse all sources into one entry per id.
///
/// Sources are scanned in priority order (remote cache, created, joined,
/// fallback) and the first copy of each id wins, so the result order is the
/// order of first appearance in that scan.
pub fn merge(sources: &MergeSources<'_>) -> Vec<Activity> {
    let mut seen: HashSet<&ActivityId> = HashSet::new();

    sources
        .remote_cache
        .iter()
        .chain(sources.created)
        .chain(sources.joined)
        .chain(sources.fallback)
        .filter(|&activity| seen.insert(&activity.id))
        .cloned()
        .collect()
}
