use std::path::PathBuf;

use thiserror::Error;

/// Failure of a persistence collaborator (favorites store or day-summary cache).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt store data in {}: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },

    #[error("invalid cache key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Failure reported by a weather provider.
///
/// `status` carries the HTTP status when the provider answered; it is `None`
/// for transport and decoding failures.
#[derive(Debug, Error)]
#[error("{}", describe_upstream(.status, .message))]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub message: String,
}

fn describe_upstream(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("upstream responded with status {status}: {message}"),
        None => format!("upstream request failed: {message}"),
    }
}

impl UpstreamError {
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self { status: Some(status), message: message.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into() }
    }
}

/// Failure scoped to a single favorite location. Never aborts a run.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("invalid favorite record: {0}")]
    InvalidRecord(String),

    #[error("day summary cache: {0}")]
    Cache(#[from] StoreError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Whole-run failure: nothing was processed and no partial result exists.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to list favorite locations: {0}")]
    FavoritesUnavailable(#[source] StoreError),
}
