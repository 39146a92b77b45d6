//! Error types for the interceptor engine.

use thiserror::Error;

/// Main error type for interceptor operations
#[derive(Debug, Error)]
pub enum InterceptError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("rule payload encoding failed: {0}")]
    RuleEncoding(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Result type alias for interceptor operations
pub type InterceptResult<T> = Result<T, InterceptError>;
