//! User-facing entry point for test-traffic tagging.
//!
//! The [`Agent`] constructs interceptor variants for the transport family a
//! test suite uses and exposes the cooperating agent's configuration
//! resources. The [`Interceptor`] enum is the closed set of transport
//! adapters; adding a transport means adding a variant.

pub mod config;
pub mod error;

pub use config::{AgentConfig, Config, ConfigResource, ConfigSummary};
pub use error::{AgentError, AgentResult};

use intercept_core::engine::InterceptEngine;
use intercept_core::{ApplyOptions, ClientInterceptor, Framework, InterceptorOptions};
use route_engine::{HarnessRouter, PageRouter};
use url::Url;

/// Default URL of the cooperating agent's API.
pub const DEFAULT_AGENT_URL: &str = "http://localhost:8080";

/// Entry point: adapter factory plus remote configuration access.
#[derive(Debug, Clone)]
pub struct Agent {
    api_url: Url,
    client: reqwest::Client,
}

impl Agent {
    pub fn new() -> Self {
        // The default URL is a constant; parsing it cannot fail.
        Self::with_url(DEFAULT_AGENT_URL).expect("default agent url is valid")
    }

    pub fn with_url(url: &str) -> AgentResult<Self> {
        Ok(Self {
            api_url: Url::parse(url)?,
            client: reqwest::Client::new(),
        })
    }

    pub fn set_api_url(&mut self, url: &str) -> AgentResult<()> {
        self.api_url = Url::parse(url)?;
        Ok(())
    }

    /// Configuration resources of the cooperating agent.
    pub fn config(&self) -> Config {
        Config::new(ConfigResource::new(self.client.clone(), self.api_url.clone()))
    }

    /// Construct the interceptor variant selected by the options.
    pub fn interceptor(&self, options: InterceptorOptions) -> Interceptor {
        match options.framework.unwrap_or_default() {
            Framework::Client => Interceptor::Client(ClientInterceptor::new(options)),
            Framework::Browser => Interceptor::Page(PageRouter::new(options)),
            Framework::Harness => Interceptor::Harness(HarnessRouter::new(options)),
        }
    }

    pub fn client_interceptor(&self, options: InterceptorOptions) -> ClientInterceptor {
        ClientInterceptor::new(options)
    }

    pub fn page_interceptor(&self, options: InterceptorOptions) -> PageRouter {
        PageRouter::new(options)
    }

    pub fn harness_interceptor(&self, options: InterceptorOptions) -> HarnessRouter {
        HarnessRouter::new(options)
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

/// Closed set of transport adapters.
pub enum Interceptor {
    Client(ClientInterceptor),
    Page(PageRouter),
    Harness(HarnessRouter),
}

impl Interceptor {
    /// Install interception and start (or rejoin) the session.
    pub async fn apply(&mut self, overrides: Option<ApplyOptions>) -> AgentResult<String> {
        match self {
            Interceptor::Client(interceptor) => Ok(interceptor.apply(overrides)?),
            Interceptor::Page(router) => Ok(router.apply(overrides).await?),
            Interceptor::Harness(router) => Ok(router.apply(overrides)?),
        }
    }

    /// Signal record mode to the proxy, then apply.
    pub async fn apply_record(&mut self, overrides: Option<ApplyOptions>) -> AgentResult<String> {
        match self {
            Interceptor::Client(interceptor) => Ok(interceptor.apply_record(overrides)?),
            Interceptor::Page(router) => Ok(router.apply_record(overrides).await?),
            Interceptor::Harness(router) => Ok(router.apply_record(overrides)?),
        }
    }

    /// Tear down interception and reset the session.
    pub async fn clear(&mut self) {
        match self {
            Interceptor::Client(interceptor) => interceptor.clear(),
            Interceptor::Page(router) => router.clear().await,
            Interceptor::Harness(router) => router.clear(),
        }
    }

    /// Stop signaling record mode, then clear.
    pub async fn clear_record(&mut self) {
        match self {
            Interceptor::Client(interceptor) => interceptor.clear_record(),
            Interceptor::Page(router) => router.clear_record().await,
            Interceptor::Harness(router) => router.clear_record(),
        }
    }

    /// Shared engine state of the underlying adapter.
    pub fn engine(&self) -> &InterceptEngine {
        match self {
            Interceptor::Client(interceptor) => interceptor.engine(),
            Interceptor::Page(router) => router.engine(),
            Interceptor::Harness(router) => router.engine(),
        }
    }
}
