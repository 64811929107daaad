//! Feed normalization: calendar text in, schedule document out.
//!
//! Every qualifying VEVENT becomes exactly one `Occurrence`. Recurring
//! templates contribute only their next instance at or after the window
//! start, so output size does not depend on how old a series is.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;
use crate::error::Result;
use crate::event::CalendarEvent;
use crate::ics::parse_calendar;
use crate::recurrence::next_occurrence;
use crate::title::ParsedTitle;

/// Display format for `generated_at` (e.g. `2025/03/20 21:00`)
pub const GENERATED_AT_FORMAT: &str = "%Y/%m/%d %H:%M";

#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub days_back: u32,
    pub days_ahead: u32,
    /// Zone for `generated_at`, all-day dates and floating times
    pub display_tz: Tz,
}

/// One concrete broadcast session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub streamer: String,
    pub platform: String,
    pub title: String,
    #[serde(with = "iso_millis")]
    pub start: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end: DateTime<Utc>,
    pub is_past: bool,
}

/// The artifact handed from the normalizer to the announcer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    pub generated_at: String,
    pub items: Vec<Occurrence>,
}

impl ScheduleDocument {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Normalize raw ICS text into a schedule document as of `now`.
pub fn normalize(
    ics: &str,
    now: DateTime<Utc>,
    options: &NormalizeOptions,
) -> Result<ScheduleDocument> {
    let events = collapse_events(parse_calendar(ics)?);
    let window = DateRange::around(now, options.days_back, options.days_ahead);

    let mut items: Vec<Occurrence> = events
        .iter()
        .filter_map(|event| to_occurrence(event, &window, now, options.display_tz))
        .collect();

    // Stable, so equal starts keep feed order
    items.sort_by_key(|o| o.start);

    Ok(ScheduleDocument {
        generated_at: now
            .with_timezone(&options.display_tz)
            .format(GENERATED_AT_FORMAT)
            .to_string(),
        items,
    })
}

fn to_occurrence(
    event: &CalendarEvent,
    window: &DateRange,
    now: DateTime<Utc>,
    tz: Tz,
) -> Option<Occurrence> {
    let Some(title) = ParsedTitle::parse(&event.summary) else {
        tracing::debug!("Skipping '{}': not a stream title", event.summary);
        return None;
    };

    let (start, end) = match &event.recurrence {
        Some(recurrence) => {
            let template_start = event.start.as_ref()?;
            let duration = event.duration(tz)?;
            let next = next_occurrence(template_start, recurrence, window.from, tz)?;
            if !window.contains(next) {
                tracing::debug!("Skipping '{}': next instance is past the window", event.summary);
                return None;
            }
            (next, next + duration)
        }
        None => {
            let start = event.start.as_ref()?.to_utc(tz)?;
            let end = event.end.as_ref()?.to_utc(tz)?;
            if !window.overlaps(start, end) {
                return None;
            }
            (start, end)
        }
    };

    Some(Occurrence {
        streamer: title.streamer,
        platform: title.platform,
        title: title.title,
        start,
        end,
        is_past: end < now,
    })
}

/// Apply feed-level identity rules before normalizing.
///
/// Redefinitions of a UID replace the earlier one in place. Overrides of
/// single instances (RECURRENCE-ID) belong to their recurring master and
/// are dropped; an override without a known master stands on its own.
fn collapse_events(events: Vec<CalendarEvent>) -> Vec<CalendarEvent> {
    let recurring_uids: Vec<String> = events
        .iter()
        .filter(|e| e.is_recurring() && e.recurrence_id.is_none())
        .filter_map(|e| e.uid.clone())
        .collect();

    let mut collapsed: Vec<CalendarEvent> = Vec::with_capacity(events.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for event in events {
        if event.recurrence_id.is_some() {
            let has_master = event
                .uid
                .as_ref()
                .is_some_and(|uid| recurring_uids.contains(uid));
            if !has_master {
                collapsed.push(event);
            }
            continue;
        }

        match event.uid.clone() {
            Some(uid) => match positions.get(&uid) {
                Some(&i) => collapsed[i] = event,
                None => {
                    positions.insert(uid, collapsed.len());
                    collapsed.push(event);
                }
            },
            None => collapsed.push(event),
        }
    }

    collapsed
}

/// Serialize instants as `2025-03-20T12:00:00.000Z`.
mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_instant(*dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Format an instant the way schedule documents store it.
pub fn format_instant(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
