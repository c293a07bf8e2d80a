//! End-of-day expiry policy.
//!
//! Activations expire at the end of the Nth day after their last refresh,
//! regardless of the time of day the triggering action happened.

use time::macros::time;
use time::{Duration, OffsetDateTime};

/// Source of the current UTC time, injectable for testing.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now_utc(&self) -> OffsetDateTime;
}

/// [`Clock`] backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Returns `from + n_days`, pinned to 23:59:59.000 of that day.
#[must_use]
pub fn end_of_day_expiry(from: OffsetDateTime, n_days: u32) -> OffsetDateTime {
    (from + Duration::days(i64::from(n_days))).replace_time(time!(23:59:59))
}

/// Returns `true` iff `now` is past the end-of-day expiry of a record last
/// modified at `modified`.
#[must_use]
pub fn is_expired(now: OffsetDateTime, modified: OffsetDateTime, n_days: u32) -> bool {
    now > end_of_day_expiry(modified, n_days)
}
