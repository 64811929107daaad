//! Persisted record of the last announcement.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default location of the state file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = ".bot_state/last_posted.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostState {
    #[serde(default)]
    pub last_key: Option<String>,
    #[serde(default)]
    pub last_tweet_id: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Where the announcer keeps its `PostState` between runs.
pub trait StateStore {
    /// Current state. A store that cannot be read counts as empty.
    fn load(&self) -> PostState;

    fn save(&self, state: &PostState) -> Result<()>;
}

/// JSON file store, overwritten whole on every save.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStateStore { path: path.into() }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> PostState {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return PostState::default(),
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable state file {}: {}",
                    self.path.display(),
                    e
                );
                PostState::default()
            }
        }
    }

    fn save(&self, state: &PostState) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(state)?;

        // Write to a sibling temp file, then rename over the real one
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            Error::State(format!(
                "could not replace {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(())
    }
}
