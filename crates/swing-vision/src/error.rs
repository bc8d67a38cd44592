//! Vision client error types.

use thiserror::Error;

pub type VisionResult<T> = Result<T, VisionError>;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Vision service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Rate limited by vision provider")]
    RateLimited,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl VisionError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = format!("{}: {}", status, truncate(body, 500));
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited
        } else if status.is_server_error() {
            Self::ServiceUnavailable(detail)
        } else {
            Self::RequestFailed(detail)
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VisionError::ServiceUnavailable(_) | VisionError::RateLimited | VisionError::Network(_)
        )
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
