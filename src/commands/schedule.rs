use anyhow::{Context, Result};
use chrono::Utc;
use streamcal_core::schedule::normalize;

use crate::config::ScheduleConfig;
use crate::fetch::fetch_calendar;

pub async fn run(config: ScheduleConfig) -> Result<()> {
    let ics = fetch_calendar(&config.calendar_url)
        .await
        .context("Failed to fetch calendar feed")?;

    let doc = normalize(&ics, Utc::now(), &config.normalize_options())?;
    let json = doc.to_json()?;

    if let Some(dir) = config.out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    std::fs::write(&config.out, json)
        .with_context(|| format!("Failed to write {}", config.out.display()))?;

    tracing::info!(
        "Wrote {} with {} items",
        config.out.display(),
        doc.items.len()
    );

    Ok(())
}
