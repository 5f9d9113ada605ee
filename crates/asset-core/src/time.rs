//! # Timestamps
//!
//! `updated_at` is stored as text, so the text form has to sort the same way
//! the instants do. We always write RFC 3339 in UTC with exactly three
//! fractional digits and a `Z` suffix:
//!
//! ```text
//! 2026-10-19T08:15:02.417Z
//! 2026-10-19T08:15:02.418Z   ← lexicographic order == time order
//! ```
//!
//! Parsing is more forgiving because imported spreadsheets carry whatever
//! their authors typed.

use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

/// Formats a timestamp in the canonical, sortable storage form.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a timestamp from storage or from an imported cell.
///
/// ## Accepted Forms
/// - RFC 3339 (`2026-10-19T08:15:02.417Z`, `2026-10-19T10:15:02+02:00`)
/// - `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS` (taken as UTC)
/// - `YYYY-MM-DD` (midnight UTC)
///
/// Returns `None` for anything else, including blank input.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).trunc_subsecs(3));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Hands out strictly increasing millisecond timestamps.
///
/// Two saves inside the same millisecond would otherwise get identical
/// stamps and the second mutation would not be visible in the ordering.
/// When the wall clock has not advanced past the last stamp, the clock
/// bumps the last stamp by one millisecond instead.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    /// Creates a clock with no history.
    pub fn new() -> Self {
        MonotonicClock::default()
    }

    /// Returns the next stamp, never earlier than or equal to the previous one.
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().trunc_subsecs(3);
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let next = match *last {
            Some(prev) if prev >= wall => prev + Duration::milliseconds(1),
            _ => wall,
        };

        *last = Some(next);
        next
    }
}
