// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
///
/// Micro-second precision keeps rows written in the same second in
/// insertion order when sorted as strings.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time formatted with [`format_utc_rfc3339`].
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}
