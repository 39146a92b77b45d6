//! The agent facade drives every adapter variant through one surface.

use intercept_core::constants::{SCENARIO_KEY, SESSION_ID};
use intercept_core::registry::{self, TransportSlot};
use intercept_core::{Framework, InterceptorOptions, UrlPattern};
use lazy_static::lazy_static;
use route_engine::{RouteHandler, RouteRequest, RouteScope, ScopeError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tag_agent::{Agent, Interceptor};

lazy_static! {
    static ref TEST_LOCK: Mutex<()> = Mutex::new(());
}

fn test_lock() -> MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
struct RecordingScope {
    routes: Mutex<Vec<(UrlPattern, RouteHandler)>>,
}

impl RecordingScope {
    fn fire(&self, url: &str) -> Option<HashMap<String, String>> {
        let routes = self.routes.lock().unwrap();
        let (_, handler) = routes.iter().find(|(pattern, _)| pattern.matches(url))?;
        Some(handler.as_ref()(&RouteRequest {
            url: url.to_string(),
            headers: HashMap::new(),
        }))
    }
}

#[async_trait::async_trait]
impl RouteScope for RecordingScope {
    async fn route(&self, pattern: &UrlPattern, handler: RouteHandler) -> Result<(), ScopeError> {
        self.routes.lock().unwrap().push((pattern.clone(), handler));
        Ok(())
    }

    async fn unroute(&self, pattern: &UrlPattern) -> Result<(), ScopeError> {
        self.routes.lock().unwrap().retain(|(p, _)| p != pattern);
        Ok(())
    }
}

#[tokio::test]
async fn test_client_variant_decorates_through_the_registry() {
    let _guard = test_lock();
    let agent = Agent::new();
    let mut interceptor = agent.interceptor(
        InterceptorOptions::new()
            .with_url("https://x/a")
            .with_scenario_key("facade")
            .with_session_id("run-9"),
    );

    let session_id = interceptor.apply(None).await.unwrap();
    assert_eq!(session_id, "run-9");

    let headers = registry::decorate(TransportSlot::AsyncClient, "https://x/a", &HashMap::new())
        .expect("matching request should be decorated");
    assert_eq!(headers.get(SCENARIO_KEY).map(String::as_str), Some("facade"));
    assert_eq!(headers.get(SESSION_ID).map(String::as_str), Some("run-9"));

    interceptor.clear().await;
    assert!(
        registry::decorate(TransportSlot::AsyncClient, "https://x/a", &HashMap::new()).is_none()
    );
}

#[tokio::test]
async fn test_page_variant_routes_through_a_bound_scope() {
    let _guard = test_lock();
    let agent = Agent::new();
    let mut interceptor = agent.interceptor(
        InterceptorOptions::new()
            .with_framework(Framework::Browser)
            .with_url("https://x/a")
            .with_scenario_key("routed"),
    );

    let scope = Arc::new(RecordingScope::default());
    match &mut interceptor {
        Interceptor::Page(router) => {
            router.with_page(Arc::clone(&scope) as Arc<dyn RouteScope>);
        }
        _ => panic!("browser framework should build the page variant"),
    }

    interceptor.apply(None).await.unwrap();
    let headers = scope.fire("https://x/a").unwrap();
    assert_eq!(headers.get(SCENARIO_KEY).map(String::as_str), Some("routed"));

    interceptor.clear().await;
    assert!(scope.fire("https://x/a").is_none());
}
