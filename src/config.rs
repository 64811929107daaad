//! Run configuration, read once at startup from flags and environment.
//!
//! Every option can come from the environment (optionally via a `.env`
//! file), which is how scheduled jobs usually supply them.

use anyhow::{Result, bail};
use chrono_tz::Tz;
use clap::Args;
use std::path::PathBuf;
use streamcal_core::announcer::AnnounceOptions;
use streamcal_core::schedule::NormalizeOptions;
use streamcal_core::state::DEFAULT_STATE_FILE;
use url::Url;

/// Settings for `streamcal schedule`.
#[derive(Args, Debug, Clone)]
pub struct ScheduleConfig {
    /// ICS feed to read (http, https or webcal)
    #[arg(long, env = "CALENDAR_ICS_URL", value_parser = parse_feed_url)]
    pub calendar_url: Url,

    /// IANA time zone for generated_at, all-day and floating times
    #[arg(long, env = "SCHEDULE_TZ", default_value = "Asia/Tokyo")]
    pub timezone: Tz,

    /// Days after now to include
    #[arg(long, env = "SCHEDULE_DAYS_AHEAD", default_value_t = 14)]
    pub days_ahead: u32,

    /// Days before now to include
    #[arg(long, env = "SCHEDULE_DAYS_BACK", default_value_t = 0)]
    pub days_back: u32,

    /// Where to write the schedule JSON
    #[arg(long, env = "SCHEDULE_OUT", default_value = "schedule.json")]
    pub out: PathBuf,
}

impl ScheduleConfig {
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            days_back: self.days_back,
            days_ahead: self.days_ahead,
            display_tz: self.timezone,
        }
    }
}

/// Settings for `streamcal announce`.
#[derive(Args, Debug, Clone)]
pub struct AnnounceConfig {
    /// URL of the schedule JSON produced by `streamcal schedule`
    #[arg(long, env = "SCHEDULE_JSON_URL")]
    pub schedule_url: Url,

    /// Schedule page linked from the announcement
    #[arg(long, env = "HP_SCHEDULE_URL")]
    pub page_url: String,

    /// Where the last announcement is recorded
    #[arg(long, env = "STREAMCAL_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    pub state_file: PathBuf,

    /// Print the announcement instead of posting it
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

impl AnnounceConfig {
    pub fn announce_options(&self) -> AnnounceOptions {
        AnnounceOptions {
            page_url: self.page_url.clone(),
            dry_run: self.dry_run,
        }
    }
}

/// X API credentials (OAuth 1.0a user context).
///
/// Optional on the command line so `--dry-run` works without them;
/// `require` enforces them for real runs.
#[derive(Args, Debug, Clone)]
pub struct CredentialArgs {
    #[arg(long, env = "X_API_KEY", hide_env_values = true)]
    pub x_api_key: Option<String>,

    #[arg(long, env = "X_API_SECRET", hide_env_values = true)]
    pub x_api_secret: Option<String>,

    #[arg(long, env = "X_ACCESS_TOKEN", hide_env_values = true)]
    pub x_access_token: Option<String>,

    #[arg(long, env = "X_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub x_access_token_secret: Option<String>,
}

#[derive(Clone)]
pub struct XCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl CredentialArgs {
    pub fn require(&self) -> Result<XCredentials> {
        Ok(XCredentials {
            api_key: required(&self.x_api_key, "X_API_KEY")?,
            api_secret: required(&self.x_api_secret, "X_API_SECRET")?,
            access_token: required(&self.x_access_token, "X_ACCESS_TOKEN")?,
            access_token_secret: required(&self.x_access_token_secret, "X_ACCESS_TOKEN_SECRET")?,
        })
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => bail!("Missing credential: {} is not set", name),
    }
}

/// Accept http(s) feed URLs, rewriting `webcal://` to `https://`.
fn parse_feed_url(s: &str) -> std::result::Result<Url, String> {
    let s = s.trim();
    let normalized = match s.strip_prefix("webcal://") {
        Some(rest) => format!("https://{}", rest),
        None => s.to_string(),
    };

    let url = Url::parse(&normalized).map_err(|e| format!("invalid URL '{}': {}", s, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported URL scheme '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webcal_url_becomes_https() {
        let url = parse_feed_url("webcal://calendar.example.com/basic.ics").unwrap();

        assert_eq!(url.as_str(), "https://calendar.example.com/basic.ics");
    }

    #[test]
    fn test_non_http_feed_url_is_rejected() {
        assert!(parse_feed_url("ftp://calendar.example.com/basic.ics").is_err());
        assert!(parse_feed_url("not a url").is_err());
    }

    #[test]
    fn test_missing_credential_names_the_variable() {
        let args = CredentialArgs {
            x_api_key: Some("key".to_string()),
            x_api_secret: Some("secret".to_string()),
            x_access_token: Some("  ".to_string()),
            x_access_token_secret: None,
        };

        let err = args.require().err().unwrap();

        assert!(err.to_string().contains("X_ACCESS_TOKEN"));
    }
}
