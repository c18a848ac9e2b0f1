//! Time source and timestamp formatting.
//!
//! Timestamps are persisted as `YYYY-MM-DD HH:MM:SS` strings in UTC, which
//! sort lexicographically in the same order as chronologically. A far-future
//! sentinel marks a version that has not been soft-deleted.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Mutex;

/// Storage format for every timestamp column.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sentinel stored in `soft_deleted_at` for live versions.
pub const MAX_DATETIME: &str = "9999-12-31 23:59:59";

/// Source of "now" for the store.
///
/// Consulted on every create, soft delete and query compilation, so a
/// long-lived store never works against a stale timestamp.
pub trait Clock: Send + Sync {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Current time in storage format.
    fn now_string(&self) -> String {
        format_datetime(&self.now())
    }
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for deterministic tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += delta;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Format a timestamp in storage format.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Parse a storage-format timestamp. Accepts RFC 3339 as well, since some
/// backends hand datetime columns back in that shape.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
