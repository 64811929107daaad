//! Calendar event types as they come out of an ICS feed.
//!
//! Times keep the representation the feed used. They are only resolved to
//! absolute instants when the normalizer needs them, using the display zone
//! for anything that carries no zone of its own.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// A VEVENT from the calendar feed.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub uid: Option<String>,
    pub summary: String,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,

    /// RRULE and EXDATEs for recurring templates
    pub recurrence: Option<Recurrence>,
    /// Set on instance overrides of a recurring template
    pub recurrence_id: Option<EventTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recurrence {
    /// Raw RRULE value, e.g. `FREQ=WEEKLY;BYDAY=MO`
    pub rrule: String,
    pub exdates: Vec<EventTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    /// Resolve to an absolute instant.
    ///
    /// All-day dates become local midnight and floating times are read as
    /// local time in `fallback`. Zoned times whose TZID chrono-tz does not
    /// know also fall back. Returns `None` for local times that do not exist
    /// (DST gaps).
    pub fn to_utc(&self, fallback: Tz) -> Option<DateTime<Utc>> {
        match self {
            EventTime::DateTimeUtc(dt) => Some(*dt),
            EventTime::Date(d) => local_to_utc(d.and_hms_opt(0, 0, 0)?, fallback),
            EventTime::DateTimeFloating(dt) => local_to_utc(*dt, fallback),
            EventTime::DateTimeZoned { datetime, tzid } => {
                local_to_utc(*datetime, resolve_tz(tzid, fallback))
            }
        }
    }

    /// The same kind of time moved by `by`. Dates move by whole days only.
    pub fn checked_add(&self, by: chrono::Duration) -> Option<EventTime> {
        Some(match self {
            EventTime::Date(d) => EventTime::Date(d.checked_add_signed(by)?),
            EventTime::DateTimeUtc(dt) => EventTime::DateTimeUtc(dt.checked_add_signed(by)?),
            EventTime::DateTimeFloating(dt) => {
                EventTime::DateTimeFloating(dt.checked_add_signed(by)?)
            }
            EventTime::DateTimeZoned { datetime, tzid } => EventTime::DateTimeZoned {
                datetime: datetime.checked_add_signed(by)?,
                tzid: tzid.clone(),
            },
        })
    }
}

impl CalendarEvent {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Template duration (`end - start`), if both ends resolve.
    pub fn duration(&self, fallback: Tz) -> Option<chrono::Duration> {
        let start = self.start.as_ref()?.to_utc(fallback)?;
        let end = self.end.as_ref()?.to_utc(fallback)?;
        Some(end - start)
    }
}

/// Look up an IANA zone name, falling back when it is not recognized
/// (e.g. Windows zone names some feeds emit).
pub fn resolve_tz(tzid: &str, fallback: Tz) -> Tz {
    tzid.parse().unwrap_or(fallback)
}

fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        // Ambiguous (DST fold): take the first of the two
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
