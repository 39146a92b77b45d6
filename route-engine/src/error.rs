//! Route engine error types.

use thiserror::Error;

/// Main error type for route-registration transports
#[derive(Debug, Error)]
pub enum RouteEngineError {
    /// apply() without a bound page or context.
    #[error("no page or context bound; call with_page() or with_context() first")]
    ScopeRequired,

    /// apply() without a bound registrar.
    #[error("no registrar bound; call with_registrar() first")]
    RegistrarRequired,

    /// Route registration refused by a live target.
    #[error("route registration failed for {pattern}: {message}")]
    Registration { pattern: String, message: String },

    #[error(transparent)]
    Core(#[from] intercept_core::InterceptError),
}

/// Result type alias for route engine operations
pub type RouteResult<T> = Result<T, RouteEngineError>;
