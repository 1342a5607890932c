// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Filter and sort configuration for the activity list.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    #[default]
    Date,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Which activities to keep based on the user's membership sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Participation {
    #[default]
    All,
    Joined,
    Favorites,
    NotJoined,
}

/// A bound that only applies while `enabled` is set.
///
/// The bound is kept while disabled so the UI can restore it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Toggle<T> {
    pub enabled: bool,
    pub bound: T,
}

impl<T> Toggle<T> {
    pub fn enabled(bound: T) -> Self {
        Self {
            enabled: true,
            bound,
        }
    }

    pub fn disabled(bound: T) -> Self {
        Self {
            enabled: false,
            bound,
        }
    }

    /// The bound, if this dimension currently constrains anything.
    pub fn active(&self) -> Option<&T> {
        self.enabled.then_some(&self.bound)
    }
}

/// Inclusive range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Wall-clock time with minute precision, serialized as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Minutes since midnight.
    pub fn minutes(&self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("invalid time of day: {s}"))?;
        let hour = hour
            .parse()
            .map_err(|_| format!("invalid hour in time of day: {s}"))?;
        let minute = minute
            .parse()
            .map_err(|_| format!("invalid minute in time of day: {s}"))?;
        Self::new(hour, minute).ok_or_else(|| format!("time of day out of range: {s}"))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

/// Date-independent window of the day.
///
/// The window does not wrap past midnight: a window whose start is after its
/// end matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeWindow {
    pub fn contains_minute(&self, minute_of_day: u32) -> bool {
        self.start.minutes() <= minute_of_day && minute_of_day <= self.end.minutes()
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start: TimeOfDay { hour: 0, minute: 0 },
            end: TimeOfDay {
                hour: 23,
                minute: 59,
            },
        }
    }
}

/// Default search radius when the user has not picked one.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 25.0;

/// Complete filter/sort state for the activity list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfiguration {
    #[serde(default)]
    pub sort_key: SortKey,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default)]
    pub participation: Participation,
    pub date_range: Toggle<DateRange>,
    pub time_window: Toggle<TimeWindow>,
    /// Radius in kilometers around the reference location
    pub max_distance_km: Toggle<f64>,
}

impl FilterConfiguration {
    /// Default configuration with the date bound anchored at `now`.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            sort_key: SortKey::default(),
            sort_direction: SortDirection::default(),
            participation: Participation::default(),
            date_range: Toggle::disabled(DateRange {
                start: now,
                end: now + Duration::days(30),
            }),
            time_window: Toggle::disabled(TimeWindow::default()),
            max_distance_km: Toggle::disabled(DEFAULT_MAX_DISTANCE_KM),
        }
    }
}

impl Default for FilterConfiguration {
    fn default() -> Self {
        Self::starting_at(Utc::now())
    }
}
