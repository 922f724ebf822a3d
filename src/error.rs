use std::time::Duration;

use reqwest::StatusCode;

/// Failure kinds surfaced by playlist extraction.
///
/// An extraction either returns a complete track id sequence or exactly one
/// of these. `RateLimited` and `TransientNetwork` are retried by the
/// extractor before they reach the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Playlist not found: {0}")]
    NotFound(String),
    #[error("Not authorized to read playlist: {0}")]
    Authorization(String),
    #[error("Rate limited by the catalog API (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("Network failure: {0}")]
    TransientNetwork(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Invalid playlist reference: {0}")]
    InvalidReference(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractError::RateLimited { .. } | ExtractError::TransientNetwork(_)
        )
    }

    /// Maps a non-success HTTP status to its error kind.
    ///
    /// `retry_after` is only used for 429 responses.
    pub fn from_status(status: StatusCode, retry_after: Option<Duration>, context: &str) -> Self {
        match status {
            StatusCode::NOT_FOUND => ExtractError::NotFound(context.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ExtractError::Authorization(format!("{} ({})", context, status))
            }
            StatusCode::TOO_MANY_REQUESTS => ExtractError::RateLimited { retry_after },
            s if s.is_server_error() => {
                ExtractError::TransientNetwork(format!("{} ({})", context, status))
            }
            s => ExtractError::MalformedResponse(format!("unexpected status {} for {}", s, context)),
        }
    }
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ExtractError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ExtractError::from_status(status, None, &err.to_string())
        } else {
            // connect, timeout, request and body errors
            ExtractError::TransientNetwork(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::MalformedResponse(err.to_string())
    }
}
