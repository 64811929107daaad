//! ICS feed parsing using the icalendar crate's parser.

use crate::error::{Error, Result};
use crate::event::{CalendarEvent, EventTime, Recurrence};
use icalendar::{
    DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

/// Parse a whole calendar feed into its VEVENTs, in feed order.
///
/// Only a feed that cannot be read at all is an error. Individual events
/// with missing or unreadable times are still returned; deciding whether
/// they qualify is up to the normalizer.
pub fn parse_calendar(content: &str) -> Result<Vec<CalendarEvent>> {
    let unfolded = unfold(content);
    if !unfolded.contains("BEGIN:VCALENDAR") {
        return Err(Error::IcsParse("not an iCalendar feed".to_string()));
    }
    let calendar = read_calendar(&unfolded).map_err(|e| Error::IcsParse(e.to_string()))?;

    Ok(calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .map(parse_vevent)
        .collect())
}

fn parse_vevent(vevent: &Component) -> CalendarEvent {
    let uid = vevent.find_prop("UID").map(|p| p.val.to_string());
    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_default();

    let start = vevent.find_prop("DTSTART").and_then(parse_time);
    // DTEND, or DTSTART + DURATION
    let end = vevent.find_prop("DTEND").and_then(parse_time).or_else(|| {
        let duration = parse_duration(vevent.find_prop("DURATION")?.val.as_ref())?;
        start.as_ref()?.checked_add(duration)
    });

    // Recurrence (RRULE, EXDATE)
    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let exdates: Vec<EventTime> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(parse_exdate_property)
        .collect();
    let recurrence = rrule.map(|rrule| Recurrence { rrule, exdates });

    let recurrence_id = vevent.find_prop("RECURRENCE-ID").and_then(parse_time);

    CalendarEvent {
        uid,
        summary,
        start,
        end,
        recurrence,
        recurrence_id,
    }
}

fn parse_time(prop: &Property) -> Option<EventTime> {
    DatePerhapsTime::try_from(prop).ok().map(to_event_time)
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        },
    }
}

/// Parse an ISO-8601 duration such as `PT2H` or `P1D`.
fn parse_duration(value: &str) -> Option<chrono::Duration> {
    let duration = iso8601::duration(value.trim()).ok()?;
    let std_duration: std::time::Duration = duration.into();
    chrono::Duration::from_std(std_duration).ok()
}

/// Parse an EXDATE property into a list of EventTime values.
///
/// Handles `TZID=` and `VALUE=DATE` parameters, UTC and floating values, and
/// comma-separated lists.
fn parse_exdate_property(prop: &Property) -> Vec<EventTime> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if is_date {
                chrono::NaiveDate::parse_from_str(s, "%Y%m%d")
                    .ok()
                    .map(EventTime::Date)
            } else if let Some(ref tz) = tzid {
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| EventTime::DateTimeZoned {
                        datetime: dt,
                        tzid: tz.clone(),
                    })
            } else if let Some(s) = s.strip_suffix('Z') {
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| EventTime::DateTimeUtc(dt.and_utc()))
            } else {
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(EventTime::DateTimeFloating)
            }
        })
        .collect()
}
