//! Agent error types.

use thiserror::Error;

/// Main error type for agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid agent url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("config request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error(transparent)]
    Intercept(#[from] intercept_core::InterceptError),

    #[error(transparent)]
    Routing(#[from] route_engine::RouteEngineError),
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;
