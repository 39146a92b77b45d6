//! Test-harness intercept registrar adapter.
//!
//! Some harnesses expose a synchronous route registrar instead of page-level
//! routing: one handler is registered per configured pattern, and the harness
//! hands each matching request to the handler as a mutable view before
//! continuing it.

use crate::error::{RouteEngineError, RouteResult};
use intercept_core::engine::InterceptEngine;
use intercept_core::options::{ApplyOptions, InterceptorOptions};
use intercept_core::overwrite::OverwriteTracker;
use intercept_core::{ProxyMode, UrlPattern};
use std::collections::HashMap;
use std::sync::Arc;

/// Mutable request view handed to a registrar handler; the handler rewrites
/// the headers in place before the harness continues the request.
#[derive(Debug, Clone)]
pub struct HarnessRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
}

/// Handler invoked by the harness for each request matching its pattern.
pub type HarnessHandler = Arc<dyn Fn(&mut HarnessRequest) + Send + Sync>;

/// Route registrar exposed by the host harness.
pub trait InterceptRegistrar: Send + Sync {
    fn register(&self, pattern: &UrlPattern, handler: HarnessHandler);
    fn unregister(&self, pattern: &UrlPattern);
}

/// Interceptor bound to a harness intercept registrar.
pub struct HarnessRouter {
    engine: Arc<InterceptEngine>,
    options: InterceptorOptions,
    registrar: Option<Arc<dyn InterceptRegistrar>>,
    registered: Vec<UrlPattern>,
    applied: bool,
}

impl HarnessRouter {
    pub fn new(options: InterceptorOptions) -> Self {
        Self {
            engine: Arc::new(InterceptEngine::new()),
            options,
            registrar: None,
            registered: Vec::new(),
            applied: false,
        }
    }

    /// Shared engine state, for header mutation and inspection.
    pub fn engine(&self) -> &InterceptEngine {
        &self.engine
    }

    /// Bind the registrar. Binding a different registrar discards the stale
    /// registration list.
    pub fn with_registrar(&mut self, registrar: Arc<dyn InterceptRegistrar>) -> &mut Self {
        if let Some(current) = &self.registrar {
            if !Arc::ptr_eq(current, &registrar) {
                self.registered.clear();
                self.applied = false;
            }
        }
        self.registrar = Some(registrar);
        self
    }

    pub fn set_test_name(&self, name: &str) -> &Self {
        self.engine.with_test_name(Some(name));
        self
    }

    pub fn with_scenario_key(&self, key: Option<&str>) -> &Self {
        self.engine.with_scenario_key(key);
        self
    }

    pub fn with_scenario_name(&self, name: Option<&str>) -> &Self {
        self.engine.with_scenario_name(name);
        self
    }

    pub fn with_session_id(&self, session_id: Option<&str>) -> &Self {
        self.engine.with_session_id(session_id);
        self
    }

    /// Tear down handlers from any previous cycle, rebind the URL rules,
    /// register fresh handlers, and enter the session.
    pub fn apply(&mut self, overrides: Option<ApplyOptions>) -> RouteResult<String> {
        self.restore();

        let urls = overrides
            .as_ref()
            .and_then(|overrides| overrides.urls.clone())
            .unwrap_or_else(|| self.options.urls.clone());
        self.engine.set_urls(urls);

        self.decorate()?;

        Ok(self.engine.enter_session(&self.options, overrides.as_ref())?)
    }

    /// Signal record mode to the proxy, then apply.
    pub fn apply_record(&mut self, overrides: Option<ApplyOptions>) -> RouteResult<String> {
        self.engine.with_intercept_mode(Some(ProxyMode::Record));
        self.apply(overrides)
    }

    /// Select a scenario, then apply.
    pub fn apply_scenario(
        &mut self,
        scenario_key: Option<&str>,
        overrides: Option<ApplyOptions>,
    ) -> RouteResult<String> {
        self.engine.with_scenario_key(scenario_key);
        self.apply(overrides)
    }

    /// Tear down handlers and reset the session. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.restore();
        self.engine.clear_session();
    }

    /// Stop signaling record mode without wiping other headers, then clear.
    pub fn clear_record(&mut self) {
        self.engine.with_intercept_mode(None);
        self.clear();
    }

    fn decorate(&mut self) -> RouteResult<()> {
        if self.applied {
            return Ok(());
        }
        let registrar = self
            .registrar
            .clone()
            .ok_or(RouteEngineError::RegistrarRequired)?;

        let prepared = self.engine.prepare_rules()?;
        let tracker = Arc::new(OverwriteTracker::snapshot(&self.engine.urls()));

        for rule in prepared {
            let engine = Arc::clone(&self.engine);
            let tracker = Arc::clone(&tracker);
            let pattern = rule.pattern.clone();
            let handler: HarnessHandler = Arc::new(move |request: &mut HarnessRequest| {
                request.headers = engine.decorate_route(&rule, &request.headers, &tracker);
            });
            registrar.register(&pattern, handler);
            self.registered.push(pattern);
        }

        self.applied = true;
        Ok(())
    }

    fn restore(&mut self) {
        if !self.applied {
            self.registered.clear();
            return;
        }

        if let Some(registrar) = &self.registrar {
            for pattern in self.registered.drain(..) {
                registrar.unregister(&pattern);
            }
        } else {
            self.registered.clear();
        }

        self.applied = false;
    }
}
