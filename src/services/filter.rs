// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Filter and sort pipeline for the activity list.
//!
//! Stages run in a fixed order:
//! 1. Date range
//! 2. Time of day
//! 3. Participation (joined / favorites / not joined)
//! 4. Distance from the reference location
//! 5. Stable sort by the configured key and direction

use crate::models::filter::{FilterConfiguration, Participation, SortDirection, SortKey};
use crate::models::{Activity, ActivityId};
use crate::time_utils::minute_of_day;
use chrono::FixedOffset;
use geo::{Distance, Haversine, Point};
use std::cmp::Reverse;
use std::collections::HashSet;

/// State the filter reads besides the configuration itself.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Ids the user currently participates in
    pub joined: &'a HashSet<ActivityId>,
    /// Ids the user marked as favorite
    pub favorites: &'a HashSet<ActivityId>,
    /// Where distances are measured from; without one the distance stage
    /// is skipped.
    pub reference: Option<Point<f64>>,
    /// Offset used to read the wall-clock time of an activity.
    pub utc_offset: FixedOffset,
}

/// Apply `config` to `activities`, returning the kept activities in order.
pub fn apply(
    config: &FilterConfiguration,
    ctx: &FilterContext<'_>,
    activities: Vec<Activity>,
) -> Vec<Activity> {
    let mut kept: Vec<Activity> = activities
        .into_iter()
        .filter(|a| matches_date_range(config, a))
        .filter(|a| matches_time_window(config, ctx, a))
        .filter(|a| matches_participation(config.participation, ctx, a))
        .filter(|a| matches_distance(config, ctx, a))
        .collect();

    sort_activities(&mut kept, config.sort_key, config.sort_direction);
    kept
}

fn matches_date_range(config: &FilterConfiguration, activity: &Activity) -> bool {
    config
        .date_range
        .active()
        .is_none_or(|range| range.contains(activity.scheduled_at))
}

fn matches_time_window(
    config: &FilterConfiguration,
    ctx: &FilterContext<'_>,
    activity: &Activity,
) -> bool {
    config.time_window.active().is_none_or(|window| {
        window.contains_minute(minute_of_day(activity.scheduled_at, ctx.utc_offset))
    })
}

fn matches_participation(
    participation: Participation,
    ctx: &FilterContext<'_>,
    activity: &Activity,
) -> bool {
    match participation {
        Participation::All => true,
        Participation::Joined => ctx.joined.contains(&activity.id),
        Participation::Favorites => ctx.favorites.contains(&activity.id),
        Participation::NotJoined => !ctx.joined.contains(&activity.id),
    }
}

fn matches_distance(config: &FilterConfiguration, ctx: &FilterContext<'_>, activity: &Activity) -> bool {
    match (config.max_distance_km.active(), ctx.reference) {
        (Some(&max_km), Some(reference)) => distance_km(reference, activity.location()) <= max_km,
        _ => true,
    }
}

/// Great-circle distance between two points in kilometers.
pub fn distance_km(from: Point<f64>, to: Point<f64>) -> f64 {
    Haversine.distance(from, to) / 1000.0
}

/// Stable sort; equal keys keep their input order.
fn sort_activities(activities: &mut [Activity], key: SortKey, direction: SortDirection) {
    match (key, direction) {
        (SortKey::Date, SortDirection::Ascending) => {
            activities.sort_by_key(|a| a.scheduled_at);
        }
        (SortKey::Date, SortDirection::Descending) => {
            activities.sort_by_key(|a| Reverse(a.scheduled_at));
        }
        (SortKey::Name, SortDirection::Ascending) => {
            activities.sort_by_cached_key(|a| a.title.to_lowercase());
        }
        (SortKey::Name, SortDirection::Descending) => {
            activities.sort_by_cached_key(|a| Reverse(a.title.to_lowercase()));
        }
    }
}
