//! Error types for image generation and the pages that drive it.

use std::time::Duration;

/// Longest upstream error body kept in an error message.
const MAX_ERROR_MESSAGE_CHARS: usize = 300;

/// Errors that can occur while generating images.
#[derive(Debug, thiserror::Error)]
pub enum PixPromptError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body, or a generic message when empty.
        message: String,
    },

    /// The API answered 429.
    #[error("Rate limit exceeded. Please try again in a few seconds.")]
    RateLimited {
        /// Wait suggested by the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// The response body did not carry a usable `b64_json` payload.
    #[error("Invalid response format")]
    InvalidResponse(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Another generation is still running.
    #[error("Another image is still being generated. Please wait.")]
    Busy,

    /// The page is cooling down after the previous request.
    #[error("Please wait {}s before generating again.", .0.as_secs().max(1))]
    CoolingDown(Duration),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PixPromptError {
    /// Returns the wait hinted by the API or the cooldown, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::CoolingDown(remaining) => Some(*remaining),
            _ => None,
        }
    }
}

/// Result type alias for image generation operations.
pub type Result<T> = std::result::Result<T, PixPromptError>;

/// Reads a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Collapses whitespace and truncates an upstream error body.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_MESSAGE_CHARS {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
    truncated.push_str("...");
    truncated
}
