// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checks on the shipped fallback catalog.
//!
//! If these fail, a fresh install with no network shows an empty list.

use activity_sync::services::FallbackCatalog;
use std::collections::HashSet;
use validator::Validate;

fn load_catalog() -> FallbackCatalog {
    FallbackCatalog::load_from_file("data/fallback_activities.json")
        .expect("Failed to load fallback activities - is data/ committed?")
}

#[test]
fn test_fallback_catalog_loads() {
    let catalog = load_catalog();
    assert!(
        !catalog.activities().is_empty(),
        "Should ship at least one fallback activity"
    );
}

#[test]
fn test_fallback_activities_are_valid_and_unique() {
    let catalog = load_catalog();
    let mut seen = HashSet::new();

    for activity in catalog.activities() {
        assert!(
            activity.validate().is_ok(),
            "Fallback activity {} is invalid",
            activity.id
        );
        assert!(
            seen.insert(activity.id.clone()),
            "Duplicate fallback id {}",
            activity.id
        );
        assert!(activity.embedded_image().is_none());
    }
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(FallbackCatalog::load_from_file("data/does_not_exist.json").is_err());
}
