// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time conversion.

use chrono::{DateTime, FixedOffset, SecondsFormat, Timelike, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert a UTC timestamp to floating-point epoch seconds (transport format).
pub fn to_epoch_seconds(date: DateTime<Utc>) -> f64 {
    date.timestamp() as f64 + f64::from(date.timestamp_subsec_nanos()) / 1e9
}

/// Convert floating-point epoch seconds back to a UTC timestamp.
///
/// Returns `None` for non-finite or out-of-range values.
pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    // Round to microseconds so values survive the f64 round trip.
    let micros = ((seconds - whole) * 1e6).round() as u32;
    let (whole, micros) = if micros >= 1_000_000 {
        (whole + 1.0, 0)
    } else {
        (whole, micros)
    };
    DateTime::from_timestamp(whole as i64, micros * 1_000)
}

/// Minutes since local midnight (`hour * 60 + minute`) in the given offset.
pub fn minute_of_day(date: DateTime<Utc>, offset: FixedOffset) -> u32 {
    let local = date.with_timezone(&offset);
    local.hour() * 60 + local.minute()
}
