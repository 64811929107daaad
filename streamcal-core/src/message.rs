//! Announcement text for a selected event.

use chrono::{DateTime, Duration, Utc};

use crate::selection::{SelectedEvent, collapse_whitespace};

/// Post length limit, in characters.
pub const MAX_POST_CHARS: usize = 280;

const TRUNCATION_MARKER: char = '…';

/// Announcements always show Japan Standard Time (UTC+9, no DST).
const ANNOUNCE_UTC_OFFSET_HOURS: i64 = 9;

/// Render the announcement for `event`, linking to `page_url`.
///
/// Streamer, platform and title lines are left out entirely when empty.
pub fn build_message(event: &SelectedEvent, page_url: &str) -> String {
    let streamer = optional_line("🌹", &event.streamer);
    let platform = optional_line("🧩", &event.platform);
    let title = optional_line("📺", &event.title);

    let body = format!(
        "【配信予定のお知らせ📣】\n\
         \n\
         🕗 {}\n\
         {streamer}{platform}{title}\n\
         🔗 {page_url}\n\
         \n\
         初見さんも大歓迎！ぜひ遊びにきてね✨",
        format_announce_time(event.start_instant)
    );

    truncate(&body, MAX_POST_CHARS)
}

fn optional_line(icon: &str, value: &str) -> String {
    let value = collapse_whitespace(value);
    if value.is_empty() {
        String::new()
    } else {
        format!("{icon} {value}\n")
    }
}

/// `YYYY/MM/DD HH:MM` at UTC+9.
pub fn format_announce_time(instant: DateTime<Utc>) -> String {
    (instant + Duration::hours(ANNOUNCE_UTC_OFFSET_HOURS))
        .naive_utc()
        .format("%Y/%m/%d %H:%M")
        .to_string()
}

/// Cut `text` to at most `max` characters. Longer text keeps its first
/// `max - 1` characters followed by `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(streamer: &str, platform: &str, title: &str) -> SelectedEvent {
        let start_instant = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
        SelectedEvent {
            start: "2025-03-20T12:00:00.000Z".to_string(),
            start_instant,
            title: title.to_string(),
            streamer: streamer.to_string(),
            platform: platform.to_string(),
            is_past: Some(false),
        }
    }

    #[test]
    fn test_full_message_layout() {
        let text = build_message(&event("Riko", "twitch", "Ranked"), "https://example.com/schedule");

        assert_eq!(
            text,
            "【配信予定のお知らせ📣】\n\
             \n\
             🕗 2025/03/20 21:00\n\
             🌹 Riko\n\
             🧩 twitch\n\
             📺 Ranked\n\
             \n\
             🔗 https://example.com/schedule\n\
             \n\
             初見さんも大歓迎！ぜひ遊びにきてね✨"
        );
    }

    #[test]
    fn test_empty_fields_drop_their_lines() {
        let text = build_message(&event("Riko", "", "  "), "https://example.com/schedule");

        assert!(text.contains("🌹 Riko\n"));
        assert!(!text.contains("🧩"));
        assert!(!text.contains("📺"));
        assert!(text.contains("🌹 Riko\n\n🔗 https://example.com/schedule"));
    }

    #[test]
    fn test_announce_time_crosses_date_line() {
        let late = Utc.with_ymd_and_hms(2025, 12, 31, 16, 30, 0).unwrap();

        assert_eq!(format_announce_time(late), "2026/01/01 01:30");
    }

    #[test]
    fn test_truncate_exact_length() {
        let source: String = (0..300).map(|i| char::from(b'a' + (i % 26) as u8)).collect();

        let truncated = truncate(&source, 280);

        assert_eq!(truncated.chars().count(), 280);
        assert_eq!(
            truncated.chars().take(279).collect::<String>(),
            source.chars().take(279).collect::<String>()
        );
        assert_eq!(truncated.chars().last(), Some('…'));
    }

    #[test]
    fn test_truncate_leaves_short_text_alone() {
        assert_eq!(truncate("short", 280), "short");
        let exactly: String = "x".repeat(280);
        assert_eq!(truncate(&exactly, 280), exactly);
    }

    #[test]
    fn test_long_title_is_truncated_to_limit() {
        let text = build_message(&event("Riko", "twitch", &"長".repeat(400)), "https://example.com");

        assert_eq!(text.chars().count(), MAX_POST_CHARS);
        assert!(text.ends_with('…'));
    }
}
