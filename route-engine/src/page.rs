//! Page/context route-registration adapter.
//!
//! Binds the interceptor engine to up to two independent routing scopes: a
//! page and a browser context. Each scope keeps its own handler map so
//! restoring one never disturbs the other, and teardown tolerates targets
//! that closed mid-test.

use crate::error::{RouteEngineError, RouteResult};
use crate::scope::{RouteHandler, RouteRequest, RouteScope, ScopeError};
use intercept_core::engine::{InterceptEngine, PreparedRule};
use intercept_core::options::{ApplyOptions, InterceptorOptions};
use intercept_core::overwrite::OverwriteTracker;
use intercept_core::{ProxyMode, UrlPattern};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Interceptor bound to page and/or browser-context routing scopes.
pub struct PageRouter {
    engine: Arc<InterceptEngine>,
    options: InterceptorOptions,
    page: Option<Arc<dyn RouteScope>>,
    context: Option<Arc<dyn RouteScope>>,
    page_routes: HashMap<String, UrlPattern>,
    context_routes: HashMap<String, UrlPattern>,
    applied: bool,
}

impl PageRouter {
    pub fn new(options: InterceptorOptions) -> Self {
        Self {
            engine: Arc::new(InterceptEngine::new()),
            options,
            page: None,
            context: None,
            page_routes: HashMap::new(),
            context_routes: HashMap::new(),
            applied: false,
        }
    }

    /// Shared engine state, for header mutation and inspection.
    pub fn engine(&self) -> &InterceptEngine {
        &self.engine
    }

    /// Bind the page scope.
    ///
    /// Binding a different page discards the stale handler map so the new
    /// page's registration is not mistaken for already-applied.
    pub fn with_page(&mut self, page: Arc<dyn RouteScope>) -> &mut Self {
        if let Some(current) = &self.page {
            if !Arc::ptr_eq(current, &page) {
                self.page_routes.clear();
                self.applied = false;
            }
        }
        self.page = Some(page);
        self
    }

    /// Bind the browser-context scope; same staleness rules as `with_page`.
    pub fn with_context(&mut self, context: Arc<dyn RouteScope>) -> &mut Self {
        if let Some(current) = &self.context {
            if !Arc::ptr_eq(current, &context) {
                self.context_routes.clear();
                self.applied = false;
            }
        }
        self.context = Some(context);
        self
    }

    /// Route-based hosts cannot always resolve a test identity on their own;
    /// set it explicitly per test.
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

    /// Tear down routes from any previous cycle, rebind the URL rules,
    /// register fresh routes, and enter the session.
    pub async fn apply(&mut self, overrides: Option<ApplyOptions>) -> RouteResult<String> {
        self.restore().await;

        let urls = overrides
            .as_ref()
            .and_then(|overrides| overrides.urls.clone())
            .unwrap_or_else(|| self.options.urls.clone());
        self.engine.set_urls(urls);

        self.decorate().await?;

        Ok(self.engine.enter_session(&self.options, overrides.as_ref())?)
    }

    /// Signal record mode to the proxy, then apply.
    pub async fn apply_record(&mut self, overrides: Option<ApplyOptions>) -> RouteResult<String> {
        self.engine.with_intercept_mode(Some(ProxyMode::Record));
        self.apply(overrides).await
    }

    /// Select a scenario, then apply.
    pub async fn apply_scenario(
        &mut self,
        scenario_key: Option<&str>,
        overrides: Option<ApplyOptions>,
    ) -> RouteResult<String> {
        self.engine.with_scenario_key(scenario_key);
        self.apply(overrides).await
    }

    /// Tear down routes and reset the session. Safe to call repeatedly.
    pub async fn clear(&mut self) {
        self.restore().await;
        self.engine.clear_session();
    }

    /// Stop signaling record mode without wiping other headers, then clear.
    pub async fn clear_record(&mut self) {
        self.engine.with_intercept_mode(None);
        self.clear().await;
    }

    /// Register one route per configured rule on every bound scope; no-op
    /// when this cycle already registered them.
    async fn decorate(&mut self) -> RouteResult<()> {
        if self.applied {
            return Ok(());
        }
        if self.page.is_none() && self.context.is_none() {
            return Err(RouteEngineError::ScopeRequired);
        }

        let prepared = self.engine.prepare_rules()?;
        let tracker = Arc::new(OverwriteTracker::snapshot(&self.engine.urls()));

        if let Some(page) = self.page.clone() {
            register_scope(&page, &self.engine, &prepared, &tracker, &mut self.page_routes).await?;
        }
        if let Some(context) = self.context.clone() {
            register_scope(
                &context,
                &self.engine,
                &prepared,
                &tracker,
                &mut self.context_routes,
            )
            .await?;
        }

        self.applied = true;
        Ok(())
    }

    /// Remove every registered route. Closed targets are treated as already
    /// idle; removal failures are logged, never propagated, so a page that
    /// navigated away mid-cleanup cannot fail a test.
    async fn restore(&mut self) {
        if !self.applied {
            self.page_routes.clear();
            self.context_routes.clear();
            return;
        }

        match self.page.clone() {
            Some(page) => unregister_scope(&page, &mut self.page_routes).await,
            None => self.page_routes.clear(),
        }
        match self.context.clone() {
            Some(context) => unregister_scope(&context, &mut self.context_routes).await,
            None => self.context_routes.clear(),
        }

        self.applied = false;
    }
}

async fn register_scope(
    scope: &Arc<dyn RouteScope>,
    engine: &Arc<InterceptEngine>,
    prepared: &[PreparedRule],
    tracker: &Arc<OverwriteTracker>,
    registered: &mut HashMap<String, UrlPattern>,
) -> RouteResult<()> {
    if scope.is_closed() {
        warn!("routing target already closed; skipping route registration");
        return Ok(());
    }

    for rule in prepared {
        let key = rule.pattern.key().to_string();
        if registered.contains_key(&key) {
            continue;
        }

        match scope.route(&rule.pattern, make_handler(engine, rule, tracker)).await {
            Ok(()) => {
                registered.insert(key, rule.pattern.clone());
            }
            Err(ScopeError::TargetClosed) => {
                warn!(pattern = %rule.pattern, "routing target closed during registration");
                return Ok(());
            }
            Err(ScopeError::Other(message)) => {
                return Err(RouteEngineError::Registration { pattern: key, message });
            }
        }
    }

    Ok(())
}

fn make_handler(
    engine: &Arc<InterceptEngine>,
    rule: &PreparedRule,
    tracker: &Arc<OverwriteTracker>,
) -> RouteHandler {
    let engine = Arc::clone(engine);
    let rule = rule.clone();
    let tracker = Arc::clone(tracker);
    Arc::new(move |request: &RouteRequest| {
        engine.decorate_route(&rule, &request.headers, &tracker)
    })
}

async fn unregister_scope(
    scope: &Arc<dyn RouteScope>,
    registered: &mut HashMap<String, UrlPattern>,
) {
    if scope.is_closed() {
        debug!("routing target closed; treating routes as already removed");
        registered.clear();
        return;
    }

    for (key, pattern) in registered.drain() {
        if let Err(error) = scope.unroute(&pattern).await {
            warn!(pattern = %key, %error, "failed to remove route");
        }
    }
}
