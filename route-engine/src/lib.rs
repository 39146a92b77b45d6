//! Route-registration transports for the interceptor engine.
//!
//! Where the client transports decorate requests by patching the tagged
//! clients, these adapters register route handlers with a host instead:
//!
//! - **PageRouter**: page and/or browser-context routing scopes, the way
//!   browser automation frameworks expose per-target request routing.
//! - **HarnessRouter**: a synchronous intercept registrar, the way some test
//!   harnesses route matched requests through user handlers.
//!
//! Both compose the `intercept-core` engine; the host (or a test double)
//! implements the small scope/registrar traits.

pub mod error;
pub mod harness;
pub mod page;
pub mod scope;

pub use error::{RouteEngineError, RouteResult};
pub use harness::{HarnessHandler, HarnessRequest, HarnessRouter, InterceptRegistrar};
pub use page::PageRouter;
pub use scope::{RouteHandler, RouteRequest, RouteScope, ScopeError};
