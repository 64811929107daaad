use anyhow::Result;
use chrono::Utc;
use streamcal_core::announcer::{AnnounceOutcome, Announcer};
use streamcal_core::state::FileStateStore;

use crate::config::AnnounceConfig;
use crate::fetch::HttpScheduleSource;
use crate::x::XClient;

pub async fn run(config: AnnounceConfig) -> Result<()> {
    let source = HttpScheduleSource::new(config.schedule_url.clone());
    let store = FileStateStore::new(&config.state_file);

    let outcome = if config.dry_run {
        Announcer::new(source, store, DryRunPublisher, config.announce_options())
            .run(Utc::now())
            .await?
    } else {
        // Checked before any request goes out
        let publisher = XClient::new(config.credentials.require()?)?;
        Announcer::new(source, store, publisher, config.announce_options())
            .run(Utc::now())
            .await?
    };

    match outcome {
        AnnounceOutcome::NoFutureEvent => tracing::info!("No future event. Skip."),
        AnnounceOutcome::AlreadyPosted { key } => {
            tracing::info!(%key, "Already posted for this event key. Skip.")
        }
        AnnounceOutcome::Drafted { key, text } => {
            tracing::info!(%key, "Dry run, not posting");
            println!("{}", text);
        }
        AnnounceOutcome::Published { key, post_id, text } => {
            tracing::debug!("Posted text:\n{}", text);
            tracing::info!(
                %key,
                "Posted: {}",
                post_id.as_deref().unwrap_or("(no id returned)")
            );
        }
    }

    Ok(())
}

/// Stand-in for dry runs; the announcer never calls it.
struct DryRunPublisher;

#[async_trait::async_trait]
impl streamcal_core::announcer::Publisher for DryRunPublisher {
    async fn publish(&self, _text: &str) -> streamcal_core::Result<Option<String>> {
        Err(streamcal_core::Error::Publish(
            "publishing is disabled in dry-run mode".to_string(),
        ))
    }
}
