//! Routing scope abstractions.
//!
//! The router consumes page and browser-context objects through these traits,
//! shaped after the routing surface browser automation frameworks expose: the
//! host forwards each request matching a registered pattern into the handler
//! and continues it with the returned headers. Test doubles implement the
//! same trait.

use async_trait::async_trait;
use intercept_core::UrlPattern;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Request view handed to a route handler.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
}

/// Handler registered per configured pattern; returns the full header set the
/// host should continue the request with.
pub type RouteHandler = Arc<dyn Fn(&RouteRequest) -> HashMap<String, String> + Send + Sync>;

/// Failure surfaced by a routing scope.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The underlying page or context has already closed.
    #[error("routing target closed")]
    TargetClosed,

    #[error("routing failed: {0}")]
    Other(String),
}

/// One routing scope: a page or a browser context.
#[async_trait]
pub trait RouteScope: Send + Sync {
    /// Whether the underlying target has closed.
    fn is_closed(&self) -> bool {
        false
    }

    /// Register a handler for requests matching the pattern.
    async fn route(&self, pattern: &UrlPattern, handler: RouteHandler) -> Result<(), ScopeError>;

    /// Remove a previously registered handler.
    async fn unroute(&self, pattern: &UrlPattern) -> Result<(), ScopeError>;
}
