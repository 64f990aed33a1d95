use chrono::NaiveDate;
use thiserror::Error;

/// Error type that captures credit control failures.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid reference: {0}")]
    InvalidRef(String),
    #[error(
        "policy `{policy}` levels must use strictly increasing delays \
         ({previous} days followed by {next} days)"
    )]
    LevelOrdering {
        policy: String,
        previous: i64,
        next: i64,
    },
    #[error(
        "run date {date} is earlier than the last completed run for \
         policy `{policy}` ({last})"
    )]
    RunDateBeforeLast {
        policy: String,
        date: NaiveDate,
        last: NaiveDate,
    },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Mail dispatch failed: {0}")]
    Mail(String),
    #[error("Render error: {0}")]
    Render(String),
}
