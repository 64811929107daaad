//! Date range for filtering events.

use chrono::{DateTime, Duration, Utc};

/// Closed window of instants `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// Window of `days_back` days before `now` to `days_ahead` days after it.
    ///
    /// Bounds past chrono's representable range saturate at its limits.
    pub fn around(now: DateTime<Utc>, days_back: u32, days_ahead: u32) -> Self {
        let back = Duration::try_days(i64::from(days_back));
        let ahead = Duration::try_days(i64::from(days_ahead));
        DateRange {
            from: back
                .and_then(|d| now.checked_sub_signed(d))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            to: ahead
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Whether an event spanning `[start, end]` touches the window.
    ///
    /// Partial overlap counts. An event ending exactly at `from` or starting
    /// exactly at `to` is kept.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        !(end < self.from || start > self.to)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.from && instant <= self.to
    }
}
