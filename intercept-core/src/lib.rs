//! Interceptor engine for tagging end-to-end test traffic.
//!
//! Decorates outbound HTTP requests with out-of-band signaling headers
//! (session identity, scenario selection, recording mode and policy, test
//! identity) that a cooperating record/replay proxy interprets. This crate
//! holds the engine itself plus the client transport adapters; the
//! route-registration transports (page/context routing, harness registrars)
//! build on it from the `route-engine` crate.
//!
//! ## Example
//!
//! ```rust,ignore
//! use intercept_core::{ClientInterceptor, InterceptorOptions, TaggedClient};
//!
//! let mut interceptor = ClientInterceptor::new(
//!     InterceptorOptions::new()
//!         .with_url("https://api.example.com/users")
//!         .with_scenario_key("user-login"),
//! );
//! let session_id = interceptor.apply(None)?;
//!
//! // Requests through the tagged client now carry the signaling headers.
//! let response = TaggedClient::new().get("https://api.example.com/users").await?;
//! ```

pub mod client;
pub mod constants;
pub mod detect;
pub mod engine;
pub mod error;
pub mod headers;
pub mod matcher;
pub mod options;
pub mod overwrite;
pub mod registry;
pub mod rules;

pub use client::{ClientInterceptor, TaggedBlockingClient, TaggedClient};
pub use constants::{ProxyMode, RecordOrder, RecordPolicy, RecordStrategy};
pub use engine::{InterceptEngine, PreparedRule};
pub use error::{InterceptError, InterceptResult};
pub use headers::HeaderState;
pub use matcher::{UrlPattern, UrlRule};
pub use options::{ApplyOptions, Framework, InterceptorOptions, RecordOptions};
pub use overwrite::{OverwriteTracker, RequestSubject};
pub use rules::{MatchRule, ParameterRule, RequestComponent, RewriteRule, UrlRewriteRule};
