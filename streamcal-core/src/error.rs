//! Error types for streamcal.

use thiserror::Error;

/// Errors that can occur while building or announcing a schedule.
#[derive(Error, Debug)]
pub enum Error {
    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("State error: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for streamcal operations.
pub type Result<T> = std::result::Result<T, Error>;
