//! Structured event titles.
//!
//! Stream events are titled `[platform]{streamer}title`, e.g.
//! `[twitch]{Riko}Ranked`. Anything else is not a stream.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTitle {
    /// Lowercased platform tag
    pub platform: String,
    pub streamer: String,
    pub title: String,
}

impl ParsedTitle {
    /// Parse a SUMMARY value. Returns `None` unless the whole summary has the
    /// `[platform]{streamer}title` shape with non-empty parts.
    pub fn parse(summary: &str) -> Option<Self> {
        let rest = summary.trim().strip_prefix('[')?;

        let (platform, rest) = rest.split_once(']')?;
        if platform.is_empty() {
            return None;
        }

        let rest = rest.trim_start().strip_prefix('{')?;
        let (streamer, rest) = rest.split_once('}')?;
        if streamer.is_empty() {
            return None;
        }

        let title = rest.trim();
        if title.is_empty() || title.contains(['\n', '\r']) {
            return None;
        }

        Some(ParsedTitle {
            platform: platform.trim().to_lowercase(),
            streamer: streamer.trim().to_string(),
            title: title.to_string(),
        })
    }
}
