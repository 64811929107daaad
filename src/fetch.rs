//! HTTP retrieval of the calendar feed and the schedule document.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use streamcal_core::announcer::ScheduleSource;
use streamcal_core::error::{Error, Result};
use url::Url;

const USER_AGENT: &str = concat!("streamcal/", env!("CARGO_PKG_VERSION"));

/// Upper bound for a whole request, body included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client shared by every outgoing request.
pub fn client() -> Result<reqwest::Client> {
    build_client(REQUEST_TIMEOUT)
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Fetch(format!("could not build HTTP client: {}", e)))
}

/// Download the ICS feed as text.
pub async fn fetch_calendar(url: &Url) -> Result<String> {
    let response = client()?
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Fetch(format!("{}: HTTP {}", url, status)));
    }

    response
        .text()
        .await
        .map_err(|e| Error::Fetch(format!("{}: {}", url, e)))
}

/// Schedule document served over HTTP.
pub struct HttpScheduleSource {
    url: Url,
}

impl HttpScheduleSource {
    pub fn new(url: Url) -> Self {
        HttpScheduleSource { url }
    }
}

#[async_trait]
impl ScheduleSource for HttpScheduleSource {
    async fn fetch(&self) -> Result<Value> {
        let response = client()?
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to fetch schedule: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("Failed to fetch schedule: HTTP {}", status)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::Fetch(format!("Schedule at {} is not JSON: {}", self.url, e)))
    }
}
