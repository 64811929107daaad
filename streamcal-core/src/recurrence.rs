//! Next-instance lookup for recurring events.
//!
//! Only ever resolves the single next instance of a template; the full
//! recurrence set is never expanded.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::event::{EventTime, Recurrence, resolve_tz};

/// Build an iCalendar-format RRULE string for the rrule crate parser.
///
/// Dates, floating times and unknown TZIDs are pinned to `fallback` so that
/// instances land on the same instants `EventTime::to_utc` would give.
fn build_rrule_string(start: &EventTime, recurrence: &Recurrence, fallback: Tz) -> String {
    let mut lines = vec![format!("DTSTART{}", ics_time(start, fallback))];

    lines.push(format!("RRULE:{}", recurrence.rrule));

    for exdate in &recurrence.exdates {
        lines.push(format!("EXDATE{}", ics_time(exdate, fallback)));
    }

    lines.join("\n")
}

/// Property suffix (parameters + value) for a DTSTART/EXDATE line.
fn ics_time(time: &EventTime, fallback: Tz) -> String {
    match time {
        EventTime::Date(d) => {
            format!(";TZID={}:{}T000000", fallback.name(), d.format("%Y%m%d"))
        }
        EventTime::DateTimeUtc(dt) => format!(":{}", dt.format("%Y%m%dT%H%M%SZ")),
        EventTime::DateTimeFloating(dt) => {
            format!(";TZID={}:{}", fallback.name(), dt.format("%Y%m%dT%H%M%S"))
        }
        EventTime::DateTimeZoned { datetime, tzid } => format!(
            ";TZID={}:{}",
            resolve_tz(tzid, fallback).name(),
            datetime.format("%Y%m%dT%H%M%S")
        ),
    }
}

/// First instance of the recurrence starting at or after `not_before`.
///
/// Returns `None` when the rule has no further instances, or when the rule
/// cannot be evaluated at all (unparseable RRULE, unsupported combination).
pub fn next_occurrence(
    start: &EventTime,
    recurrence: &Recurrence,
    not_before: DateTime<Utc>,
    fallback: Tz,
) -> Option<DateTime<Utc>> {
    let rrule_str = build_rrule_string(start, recurrence, fallback);

    let rrule_set: RRuleSet = match rrule_str.parse() {
        Ok(set) => set,
        Err(e) => {
            tracing::debug!("Skipping unparseable recurrence '{}': {}", recurrence.rrule, e);
            return None;
        }
    };

    // Step back one second and filter ourselves, so the lower bound is
    // inclusive whichever way the crate treats `after`.
    let tz: rrule::Tz = Utc.into();
    let after = not_before
        .checked_sub_signed(Duration::seconds(1))
        .unwrap_or(not_before)
        .with_timezone(&tz);

    rrule_set
        .after(after)
        .all(2)
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .find(|dt| *dt >= not_before)
}
