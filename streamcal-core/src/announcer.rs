//! The announce run: fetch the schedule, pick the next event, post it once.
//!
//! A run moves through idle → fetched → selected and ends either skipped or
//! published. State is written only after a confirmed publish, so a failed
//! or interrupted run leaves the previous state in place and the next run
//! retries the same event.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::message::build_message;
use crate::selection::{pick_next_event, schedule_items};
use crate::state::{PostState, StateStore};

/// Supplies the schedule document (normally fetched over HTTP).
#[async_trait]
pub trait ScheduleSource {
    async fn fetch(&self) -> Result<Value>;
}

/// Publishes announcement text, returning the post id if the platform
/// reported one.
#[async_trait]
pub trait Publisher {
    async fn publish(&self, text: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone)]
pub struct AnnounceOptions {
    /// Page linked from every announcement
    pub page_url: String,
    /// Build the message but neither publish nor record it
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnounceOutcome {
    NoFutureEvent,
    AlreadyPosted { key: String },
    Drafted { key: String, text: String },
    Published { key: String, post_id: Option<String>, text: String },
}

pub struct Announcer<S, T, P> {
    source: S,
    store: T,
    publisher: P,
    options: AnnounceOptions,
}

impl<S, T, P> Announcer<S, T, P>
where
    S: ScheduleSource,
    T: StateStore,
    P: Publisher,
{
    pub fn new(source: S, store: T, publisher: P, options: AnnounceOptions) -> Self {
        Announcer {
            source,
            store,
            publisher,
            options,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<AnnounceOutcome> {
        let state = self.store.load();
        let schedule = self.source.fetch().await?;
        tracing::debug!(last_key = ?state.last_key, "Fetched schedule");

        let Some(next) = pick_next_event(schedule_items(&schedule), now) else {
            return Ok(AnnounceOutcome::NoFutureEvent);
        };

        let key = next.dedup_key();
        tracing::debug!(%key, "Selected next event");
        if state.last_key.as_deref() == Some(key.as_str()) {
            return Ok(AnnounceOutcome::AlreadyPosted { key });
        }

        let text = build_message(&next, &self.options.page_url);
        if self.options.dry_run {
            return Ok(AnnounceOutcome::Drafted { key, text });
        }

        let post_id = self.publisher.publish(&text).await?;

        self.store.save(&PostState {
            last_key: Some(key.clone()),
            last_tweet_id: post_id.clone(),
            updated_at: Some(now),
        })?;

        Ok(AnnounceOutcome::Published { key, post_id, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::schedule::{NormalizeOptions, format_instant, normalize};
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    struct StaticSource(Value);

    #[async_trait]
    impl ScheduleSource for StaticSource {
        async fn fetch(&self) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ScheduleSource for FailingSource {
        async fn fetch(&self) -> Result<Value> {
            Err(Error::Fetch("HTTP 503".to_string()))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        state: Mutex<PostState>,
        saves: Mutex<usize>,
    }

    impl MemoryStore {
        fn with_key(key: &str) -> Self {
            let store = MemoryStore::default();
            store.state.lock().unwrap().last_key = Some(key.to_string());
            store
        }
    }

    impl StateStore for MemoryStore {
        fn load(&self) -> PostState {
            self.state.lock().unwrap().clone()
        }

        fn save(&self, state: &PostState) -> Result<()> {
            *self.state.lock().unwrap() = state.clone();
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        posts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, text: &str) -> Result<Option<String>> {
            if self.fail {
                return Err(Error::Publish("403 Forbidden".to_string()));
            }
            let mut posts = self.posts.lock().unwrap();
            posts.push(text.to_string());
            Ok(Some(format!("post-{}", posts.len())))
        }
    }

    fn options() -> AnnounceOptions {
        AnnounceOptions {
            page_url: "https://example.com/schedule".to_string(),
            dry_run: false,
        }
    }

    fn one_item_schedule() -> (Value, String) {
        let start = format_instant(now() + Duration::hours(1));
        let doc = json!({
            "generated_at": "2025/03/20 21:00",
            "items": [{
                "streamer": "Riko",
                "platform": "twitch",
                "title": "Ranked",
                "start": start,
                "end": format_instant(now() + Duration::hours(3)),
                "is_past": false,
            }]
        });
        (doc, format!("{start}|Riko|Ranked"))
    }

    #[tokio::test]
    async fn test_publishes_and_records_state() {
        let (doc, key) = one_item_schedule();
        let store = MemoryStore::default();
        let publisher = RecordingPublisher::default();
        let announcer = Announcer::new(StaticSource(doc), store, publisher, options());

        let outcome = announcer.run(now()).await.unwrap();

        match outcome {
            AnnounceOutcome::Published { key: k, post_id, .. } => {
                assert_eq!(k, key);
                assert_eq!(post_id.as_deref(), Some("post-1"));
            }
            other => panic!("Expected Published, got {:?}", other),
        }
        let state = announcer.store.state.lock().unwrap().clone();
        assert_eq!(state.last_key.as_deref(), Some(key.as_str()));
        assert_eq!(state.last_tweet_id.as_deref(), Some("post-1"));
        assert_eq!(state.updated_at, Some(now()));
    }

    #[tokio::test]
    async fn test_same_key_is_not_posted_again() {
        let (doc, key) = one_item_schedule();
        let store = MemoryStore::with_key(&key);
        let before = store.state.lock().unwrap().clone();
        let publisher = RecordingPublisher::default();
        let announcer = Announcer::new(StaticSource(doc), store, publisher, options());

        let outcome = announcer.run(now()).await.unwrap();

        assert_eq!(outcome, AnnounceOutcome::AlreadyPosted { key });
        assert!(announcer.publisher.posts.lock().unwrap().is_empty());
        assert_eq!(*announcer.store.saves.lock().unwrap(), 0);
        assert_eq!(*announcer.store.state.lock().unwrap(), before);
    }

    #[tokio::test]
    async fn test_no_future_event_is_a_clean_skip() {
        let doc = json!({ "items": [{ "start": format_instant(now() - Duration::days(1)) }] });
        let store = MemoryStore::default();
        let publisher = RecordingPublisher::default();
        let announcer = Announcer::new(StaticSource(doc), store, publisher, options());

        assert_eq!(announcer.run(now()).await.unwrap(), AnnounceOutcome::NoFutureEvent);
        assert!(announcer.publisher.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_leaves_state_untouched() {
        let (doc, _) = one_item_schedule();
        let store = MemoryStore::with_key("older|Riko|Yesterday");
        let publisher = RecordingPublisher {
            fail: true,
            ..Default::default()
        };
        let announcer = Announcer::new(StaticSource(doc), store, publisher, options());

        let result = announcer.run(now()).await;

        assert!(matches!(result, Err(Error::Publish(_))));
        assert_eq!(*announcer.store.saves.lock().unwrap(), 0);
        assert_eq!(
            announcer.store.state.lock().unwrap().last_key.as_deref(),
            Some("older|Riko|Yesterday")
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let store = MemoryStore::default();
        let publisher = RecordingPublisher::default();
        let announcer = Announcer::new(FailingSource, store, publisher, options());

        assert!(matches!(announcer.run(now()).await, Err(Error::Fetch(_))));
        assert!(announcer.publisher.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_neither_publishes_nor_saves() {
        let (doc, key) = one_item_schedule();
        let store = MemoryStore::default();
        let publisher = RecordingPublisher::default();
        let announcer = Announcer::new(
            StaticSource(doc),
            store,
            publisher,
            AnnounceOptions {
                dry_run: true,
                ..options()
            },
        );

        match announcer.run(now()).await.unwrap() {
            AnnounceOutcome::Drafted { key: k, text } => {
                assert_eq!(k, key);
                assert!(text.contains("📺 Ranked"));
            }
            other => panic!("Expected Drafted, got {:?}", other),
        }
        assert!(announcer.publisher.posts.lock().unwrap().is_empty());
        assert_eq!(*announcer.store.saves.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_from_feed_to_post() {
        let start = now() + Duration::hours(1);
        let end = now() + Duration::hours(3);
        let ics = format!(
            "BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:TEST\n\
             BEGIN:VEVENT\nUID:e2e\nSUMMARY:[twitch]{{Riko}}Ranked\n\
             DTSTART:{}\nDTEND:{}\nEND:VEVENT\nEND:VCALENDAR\n",
            start.format("%Y%m%dT%H%M%SZ"),
            end.format("%Y%m%dT%H%M%SZ"),
        );
        let doc = normalize(
            &ics,
            now(),
            &NormalizeOptions {
                days_back: 0,
                days_ahead: 14,
                display_tz: chrono_tz::Asia::Tokyo,
            },
        )
        .unwrap();
        assert_eq!(doc.items.len(), 1);
        assert!(!doc.items[0].is_past);

        let schedule: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        let store = MemoryStore::default();
        let publisher = RecordingPublisher::default();
        let announcer = Announcer::new(StaticSource(schedule), store, publisher, options());

        let first = announcer.run(now()).await.unwrap();
        let second = announcer.run(now()).await.unwrap();

        let posts = announcer.publisher.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].contains("🌹 Riko"));
        assert!(posts[0].contains("🧩 twitch"));
        assert!(posts[0].contains("📺 Ranked"));

        let expected_key = format!("{}|Riko|Ranked", format_instant(start));
        assert!(matches!(first, AnnounceOutcome::Published { ref key, .. } if *key == expected_key));
        assert_eq!(second, AnnounceOutcome::AlreadyPosted { key: expected_key.clone() });
        assert_eq!(
            announcer.store.state.lock().unwrap().last_key.as_deref(),
            Some(expected_key.as_str())
        );
    }
}
