//! Client transport adapter: decorates the process-global tagged clients.
//!
//! The Rust rendition of patching the host's global request functions: the
//! adapter installs a decoration hook into the transport patch registry, and
//! the tagged clients consult the registry on every request they execute.

use crate::constants::{ProxyMode, SIGNALING_HEADERS};
use crate::engine::{InterceptEngine, PreparedRule};
use crate::error::InterceptResult;
use crate::options::{ApplyOptions, InterceptorOptions};
use crate::overwrite::OverwriteTracker;
use crate::registry::{self, RequestDecorator, TransportSlot};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Engine-backed decoration hook shared by both client slots for one
/// decoration cycle, so the overwrite snapshot spans transports.
struct EngineDecorator {
    engine: Arc<InterceptEngine>,
    prepared: Vec<PreparedRule>,
    tracker: OverwriteTracker,
}

impl RequestDecorator for EngineDecorator {
    fn decorate(
        &self,
        url: &str,
        initial: &HashMap<String, String>,
    ) -> Option<HashMap<String, String>> {
        self.engine
            .decorate_url(url, initial, &self.prepared, &self.tracker)
    }
}

/// Interceptor bound to the global client transports.
///
/// `apply()` tears down hooks from any previous cycle, installs fresh ones
/// with a fresh overwrite snapshot, and enters the session.
pub struct ClientInterceptor {
    engine: Arc<InterceptEngine>,
    options: InterceptorOptions,
    owner: Uuid,
    applied_async: bool,
    applied_blocking: bool,
}

impl ClientInterceptor {
    pub fn new(options: InterceptorOptions) -> Self {
        Self {
            engine: Arc::new(InterceptEngine::new()),
            options,
            owner: Uuid::new_v4(),
            applied_async: false,
            applied_blocking: false,
        }
    }

    /// Shared engine state, for header mutation and inspection.
    pub fn engine(&self) -> &InterceptEngine {
        &self.engine
    }

    /// Install interception and start (or rejoin) the session, returning its
    /// id. Existing hooks are torn down first; the active URL rules come from
    /// the per-call overrides when given, the constructor options otherwise.
    pub fn apply(&mut self, overrides: Option<ApplyOptions>) -> InterceptResult<String> {
        self.restore();

        let urls = overrides
            .as_ref()
            .and_then(|overrides| overrides.urls.clone())
            .unwrap_or_else(|| self.options.urls.clone());
        self.engine.set_urls(urls);

        self.decorate()?;

        self.engine.enter_session(&self.options, overrides.as_ref())
    }

    /// Signal record mode to the proxy, then apply.
    pub fn apply_record(&mut self, overrides: Option<ApplyOptions>) -> InterceptResult<String> {
        self.engine.with_intercept_mode(Some(ProxyMode::Record));
        self.apply(overrides)
    }

    /// Tear down interception and reset the session. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.restore();
        self.engine.clear_session();
    }

    /// Stop signaling record mode without wiping other headers, then clear.
    pub fn clear_record(&mut self) {
        self.engine.with_intercept_mode(None);
        self.clear();
    }

    pub fn with_test_name(&self, name: Option<&str>) -> &Self {
        self.engine.with_test_name(name);
        self
    }

    pub fn with_intercept_mode(&self, mode: Option<ProxyMode>) -> &Self {
        self.engine.with_intercept_mode(mode);
        self
    }

    pub fn with_record_order(&self, order: Option<crate::constants::RecordOrder>) -> &Self {
        self.engine.with_record_order(order);
        self
    }

    pub fn with_record_policy(&self, policy: Option<crate::constants::RecordPolicy>) -> &Self {
        self.engine.with_record_policy(policy);
        self
    }

    pub fn with_record_strategy(
        &self,
        strategy: Option<crate::constants::RecordStrategy>,
    ) -> &Self {
        self.engine.with_record_strategy(strategy);
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

    /// Install the decoration hook into both client slots; no-op when this
    /// instance already decorates them.
    fn decorate(&mut self) -> InterceptResult<()> {
        if self.applied_async && self.applied_blocking {
            return Ok(());
        }

        let decorator = Arc::new(EngineDecorator {
            engine: Arc::clone(&self.engine),
            prepared: self.engine.prepare_rules()?,
            tracker: OverwriteTracker::snapshot(&self.engine.urls()),
        });

        if !self.applied_async {
            registry::install(TransportSlot::AsyncClient, self.owner, decorator.clone());
            self.applied_async = true;
        }
        if !self.applied_blocking {
            registry::install(TransportSlot::BlockingClient, self.owner, decorator);
            self.applied_blocking = true;
        }
        Ok(())
    }

    /// Remove this instance's hooks; no-op when not installed or when another
    /// instance has since taken the slots over.
    fn restore(&mut self) {
        if self.applied_async {
            registry::uninstall(TransportSlot::AsyncClient, self.owner);
        }
        self.applied_async = false;

        if self.applied_blocking {
            registry::uninstall(TransportSlot::BlockingClient, self.owner);
        }
        self.applied_blocking = false;
    }
}

/// Async HTTP client honoring the active transport decoration.
///
/// The allow-list gate runs before any header computation; requests outside
/// the configured patterns are forwarded completely untouched.
#[derive(Debug, Clone, Default)]
pub struct TaggedClient {
    inner: reqwest::Client,
}

impl TaggedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing client (connection pool, proxy, TLS setup).
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    pub async fn get(&self, url: &str) -> InterceptResult<reqwest::Response> {
        let request = reqwest::Request::new(reqwest::Method::GET, url.parse()?);
        self.execute(request).await
    }

    /// Execute a request, decorating its headers when an interceptor is
    /// active and the URL is in scope.
    pub async fn execute(&self, mut request: reqwest::Request) -> InterceptResult<reqwest::Response> {
        decorate_request(
            TransportSlot::AsyncClient,
            request.url().as_str().to_string(),
            request.headers_mut(),
        );
        Ok(self.inner.execute(request).await?)
    }
}

/// Blocking HTTP client honoring the active transport decoration.
///
/// Header injection happens after the request is constructed, immediately
/// before send: the staged open-then-send shape of legacy client transports.
#[derive(Debug, Clone)]
pub struct TaggedBlockingClient {
    inner: reqwest::blocking::Client,
}

impl Default for TaggedBlockingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TaggedBlockingClient {
    pub fn new() -> Self {
        Self {
            inner: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_client(inner: reqwest::blocking::Client) -> Self {
        Self { inner }
    }

    pub fn get(&self, url: &str) -> InterceptResult<reqwest::blocking::Response> {
        let request = reqwest::blocking::Request::new(reqwest::Method::GET, url.parse()?);
        self.execute(request)
    }

    pub fn execute(
        &self,
        mut request: reqwest::blocking::Request,
    ) -> InterceptResult<reqwest::blocking::Response> {
        decorate_request(
            TransportSlot::BlockingClient,
            request.url().as_str().to_string(),
            request.headers_mut(),
        );
        Ok(self.inner.execute(request)?)
    }
}

/// Applies the slot's active decoration to a request header map in place.
///
/// The decorator hands back the full merged header set; every entry is
/// written back, and signaling headers the overwrite filter dropped are
/// removed so an already-visited pattern does not repeat the one-shot signal.
fn decorate_request(slot: TransportSlot, url: String, headers: &mut HeaderMap) {
    let initial = header_pairs(headers);
    let decorated = match registry::decorate(slot, &url, &initial) {
        Some(decorated) => decorated,
        None => return,
    };

    for (name, value) in &decorated {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "skipping header with invalid wire representation"),
        }
    }

    for name in SIGNALING_HEADERS {
        if !decorated.contains_key(*name) {
            headers.remove(*name);
        }
    }
}

fn header_pairs(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}
