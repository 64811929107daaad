//! Picking the next event to announce from a schedule document.
//!
//! The document is read as loose JSON rather than `ScheduleDocument`, so
//! hand-edited or older schedule files still work.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// A schedule item chosen for announcement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedEvent {
    /// `start` exactly as it appeared in the document
    pub start: String,
    pub start_instant: DateTime<Utc>,
    pub title: String,
    pub streamer: String,
    pub platform: String,
    /// Only set when the document carried a JSON boolean
    pub is_past: Option<bool>,
}

impl SelectedEvent {
    /// Identity used to avoid announcing the same event twice.
    pub fn dedup_key(&self) -> String {
        format!("{}|{}|{}", self.start, self.streamer, self.title)
    }

    fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        match self.is_past {
            Some(is_past) => !is_past,
            None => self.start_instant >= now,
        }
    }
}

/// Extract the item list from the shapes a schedule can take: an object with
/// an `items` array, an object with an `events` array, or a bare array.
/// Anything else has no items.
pub fn schedule_items(schedule: &Value) -> &[Value] {
    if let Some(items) = schedule.get("items").and_then(Value::as_array) {
        return items;
    }
    if let Some(events) = schedule.get("events").and_then(Value::as_array) {
        return events;
    }
    match schedule {
        Value::Array(items) => items.as_slice(),
        _ => &[],
    }
}

/// Earliest upcoming item, if any.
///
/// An explicit `is_past` flag wins over comparing `start` with `now`, so a
/// clock that disagrees with the schedule generator does not matter.
pub fn pick_next_event(items: &[Value], now: DateTime<Utc>) -> Option<SelectedEvent> {
    let mut upcoming: Vec<SelectedEvent> = items
        .iter()
        .filter_map(to_candidate)
        .filter(|e| e.is_upcoming(now))
        .collect();

    upcoming.sort_by_key(|e| e.start_instant);
    upcoming.into_iter().next()
}

fn to_candidate(item: &Value) -> Option<SelectedEvent> {
    let raw_start = item.get("start")?;
    let start_instant = parse_instant(raw_start)?;

    Some(SelectedEvent {
        start: text_of(raw_start)?,
        start_instant,
        title: clean_field(item.get("title")),
        streamer: clean_field(item.get("streamer")),
        platform: clean_field(item.get("platform")),
        is_past: item.get("is_past").and_then(Value::as_bool),
    })
}

/// RFC 3339 text, a bare `YYYY-MM-DD` date (UTC midnight) or epoch millis.
fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                })
        }
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?),
        _ => None,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn clean_field(value: Option<&Value>) -> String {
    value
        .and_then(text_of)
        .map(|s| collapse_whitespace(&s))
        .unwrap_or_default()
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
