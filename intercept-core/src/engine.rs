//! Interceptor engine: header state machine and session lifecycle.

use crate::constants::{
    ProxyMode, RecordOrder, RecordPolicy, RecordStrategy, MATCH_RULES, OVERWRITE_ID, PROXY_MODE,
    RECORD_ORDER, RECORD_POLICY, RECORD_STRATEGY, REWRITE_RULES, SCENARIO_KEY, SCENARIO_NAME,
    SESSION_ID, TEST_NAME,
};
use crate::error::InterceptResult;
use crate::headers::HeaderState;
use crate::matcher::{self, UrlPattern, UrlRule};
use crate::options::{ApplyOptions, InterceptorOptions};
use crate::overwrite::{OverwriteTracker, RequestSubject};
use crate::rules::{encode_rules, MatchRule, RewriteRule};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// Per-rule payload headers, pre-encoded when transport hooks are installed
/// so encoding failures surface from `apply()` rather than mid-request.
#[derive(Debug, Clone)]
pub struct PreparedRule {
    pub pattern: UrlPattern,
    pub match_header: Option<String>,
    pub rewrite_header: Option<String>,
}

#[derive(Debug, Default)]
struct EngineState {
    headers: HeaderState,
    urls: Vec<UrlRule>,
    started: bool,
}

/// Shared brain of every transport adapter: signaling header state, the
/// active URL rule list, and the session flag.
///
/// Adapters hold the engine behind an `Arc` and their hooks read it lazily at
/// interception time, so header mutations between `apply()` calls are visible
/// to in-flight hooks without reinstalling anything.
#[derive(Debug)]
pub struct InterceptEngine {
    overwrite_id: String,
    state: Mutex<EngineState>,
}

impl Default for InterceptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InterceptEngine {
    pub fn new() -> Self {
        Self {
            overwrite_id: Uuid::new_v4().simple().to_string(),
            state: Mutex::new(EngineState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Correlation id for overwrite batches.
    ///
    /// Generated once at construction and stable for the engine's lifetime,
    /// so repeated recording passes from one instance land in the same
    /// logical batch on the proxy.
    pub fn overwrite_id(&self) -> &str {
        &self.overwrite_id
    }

    pub fn set_urls(&self, urls: Vec<UrlRule>) {
        self.state().urls = urls;
    }

    pub fn urls(&self) -> Vec<UrlRule> {
        self.state().urls.clone()
    }

    pub fn is_started(&self) -> bool {
        self.state().started
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.state().headers.get(name).map(str::to_string)
    }

    pub fn headers(&self) -> HashMap<String, String> {
        self.state().headers.to_map()
    }

    /// True if the URL is covered by the active rule list.
    pub fn allowed(&self, url: &str) -> bool {
        matcher::is_allowed(url, &self.state().urls)
    }

    pub fn with_test_name(&self, name: Option<&str>) -> &Self {
        self.state().headers.set(TEST_NAME, name.map(str::to_string));
        self
    }

    pub fn with_intercept_mode(&self, mode: Option<ProxyMode>) -> &Self {
        self.state()
            .headers
            .set(PROXY_MODE, mode.map(|mode| mode.as_str().to_string()));
        self
    }

    /// Overwrite order also pins the batch id header; every other value
    /// clears it so the proxy never sees a stale batch.
    pub fn with_record_order(&self, order: Option<RecordOrder>) -> &Self {
        let mut state = self.state();
        match order {
            Some(order) => {
                state
                    .headers
                    .set(RECORD_ORDER, Some(order.as_str().to_string()));
                if order == RecordOrder::Overwrite {
                    state
                        .headers
                        .set(OVERWRITE_ID, Some(self.overwrite_id.clone()));
                } else {
                    state.headers.set(OVERWRITE_ID, None);
                }
            }
            None => {
                state.headers.set(RECORD_ORDER, None);
                state.headers.set(OVERWRITE_ID, None);
            }
        }
        drop(state);
        self
    }

    pub fn with_record_policy(&self, policy: Option<RecordPolicy>) -> &Self {
        self.state()
            .headers
            .set(RECORD_POLICY, policy.map(|policy| policy.as_str().to_string()));
        self
    }

    pub fn with_record_strategy(&self, strategy: Option<RecordStrategy>) -> &Self {
        self.state().headers.set(
            RECORD_STRATEGY,
            strategy.map(|strategy| strategy.as_str().to_string()),
        );
        self
    }

    pub fn with_scenario_key(&self, key: Option<&str>) -> &Self {
        self.state().headers.set(SCENARIO_KEY, key.map(str::to_string));
        self
    }

    pub fn with_scenario_name(&self, name: Option<&str>) -> &Self {
        self.state()
            .headers
            .set(SCENARIO_NAME, name.map(str::to_string));
        self
    }

    pub fn with_session_id(&self, session_id: Option<&str>) -> &Self {
        self.state()
            .headers
            .set(SESSION_ID, session_id.map(str::to_string));
        self
    }

    pub fn with_match_rules(&self, rules: Option<&[MatchRule]>) -> InterceptResult<&Self> {
        let encoded = match rules {
            Some(rules) => encode_rules(rules)?,
            None => None,
        };
        self.state().headers.set(MATCH_RULES, encoded);
        Ok(self)
    }

    pub fn with_rewrite_rules(&self, rules: Option<&[RewriteRule]>) -> InterceptResult<&Self> {
        let encoded = match rules {
            Some(rules) => encode_rules(rules)?,
            None => None,
        };
        self.state().headers.set(REWRITE_RULES, encoded);
        Ok(self)
    }

    /// Merges caller headers with the signaling headers (engine wins) and
    /// resolves a test identity when none was set explicitly. Pure with
    /// respect to its inputs.
    pub fn decorate_headers(&self, initial: &HashMap<String, String>) -> HashMap<String, String> {
        self.state().headers.compute(initial)
    }

    /// Pre-encode every rule's payload headers for a decoration cycle.
    pub fn prepare_rules(&self) -> InterceptResult<Vec<PreparedRule>> {
        self.urls()
            .iter()
            .map(|rule| {
                Ok(PreparedRule {
                    pattern: rule.pattern.clone(),
                    match_header: encode_rules(&rule.match_rules)?,
                    rewrite_header: encode_rules(&rule.rewrite_rules)?,
                })
            })
            .collect()
    }

    /// Full per-request pipeline for client transports: allow-list gate,
    /// header merge, first-match payload attachment, overwrite filtering.
    ///
    /// Returns `None` when the URL is out of scope; such requests must pass
    /// through completely untouched.
    pub fn decorate_url(
        &self,
        url: &str,
        initial: &HashMap<String, String>,
        prepared: &[PreparedRule],
        tracker: &OverwriteTracker,
    ) -> Option<HashMap<String, String>> {
        if !self.allowed(url) {
            return None;
        }

        let mut headers = self.decorate_headers(initial);
        if let Some(rule) = prepared.iter().find(|rule| rule.pattern.matches(url)) {
            apply_rule_payloads(&mut headers, rule);
        }
        tracker.filter(&mut headers, RequestSubject::Url(url));
        Some(headers)
    }

    /// Per-request pipeline for route transports, where the transport
    /// surfaces the registered pattern rather than a concrete URL.
    pub fn decorate_route(
        &self,
        rule: &PreparedRule,
        initial: &HashMap<String, String>,
        tracker: &OverwriteTracker,
    ) -> HashMap<String, String> {
        let mut headers = self.decorate_headers(initial);
        apply_rule_payloads(&mut headers, rule);
        tracker.filter(&mut headers, RequestSubject::Pattern(&rule.pattern));
        headers
    }

    /// Enter the session.
    ///
    /// When a session was already started this returns its id without
    /// touching headers: repeated `apply()` calls (one per test, say) must
    /// not clobber headers the caller set through `with_*` in between. A
    /// fresh session merges the per-call overrides over the constructor
    /// options, derives the rule payload headers from the active URL list,
    /// and assigns the session id.
    pub fn enter_session(
        &self,
        base: &InterceptorOptions,
        overrides: Option<&ApplyOptions>,
    ) -> InterceptResult<String> {
        {
            let state = self.state();
            if state.started {
                return Ok(state
                    .headers
                    .get(SESSION_ID)
                    .unwrap_or_default()
                    .to_string());
            }
        }

        let record = overrides
            .and_then(|overrides| overrides.record.as_ref())
            .or(base.record.as_ref());
        self.with_record_order(record.and_then(|record| record.order));
        self.with_record_policy(record.and_then(|record| record.policy));
        self.with_record_strategy(record.and_then(|record| record.strategy));

        let scenario_key = overrides
            .and_then(|overrides| overrides.scenario_key.as_deref())
            .or(base.scenario_key.as_deref());
        self.with_scenario_key(scenario_key);

        let scenario_name = overrides
            .and_then(|overrides| overrides.scenario_name.as_deref())
            .or(base.scenario_name.as_deref());
        self.with_scenario_name(scenario_name);

        let urls = self.urls();
        if !urls.is_empty() {
            let match_rules: Vec<MatchRule> = urls
                .iter()
                .flat_map(|rule| rule.match_rules.iter().cloned())
                .collect();
            let rewrite_rules: Vec<RewriteRule> = urls
                .iter()
                .flat_map(|rule| rule.rewrite_rules.iter().cloned())
                .collect();
            self.with_match_rules(if match_rules.is_empty() {
                None
            } else {
                Some(&match_rules)
            })?;
            self.with_rewrite_rules(if rewrite_rules.is_empty() {
                None
            } else {
                Some(&rewrite_rules)
            })?;
        }

        let session_id = overrides
            .and_then(|overrides| overrides.session_id.clone())
            .or_else(|| base.session_id.clone())
            .unwrap_or_else(|| Utc::now().timestamp_millis().to_string());
        self.with_session_id(Some(&session_id));

        self.state().started = true;
        debug!(session_id = %session_id, "session started");
        Ok(session_id)
    }

    /// Reset to idle: headers wiped, session flag cleared.
    pub fn clear_session(&self) {
        let mut state = self.state();
        state.headers.clear();
        state.started = false;
    }
}

fn apply_rule_payloads(headers: &mut HashMap<String, String>, rule: &PreparedRule) {
    if let Some(payload) = &rule.match_header {
        headers.insert(MATCH_RULES.to_string(), payload.clone());
    }
    if let Some(payload) = &rule.rewrite_header {
        headers.insert(REWRITE_RULES.to_string(), payload.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RecordOrder;
    use crate::options::RecordOptions;
    use crate::rules::RequestComponent;
    use regex::Regex;

    fn engine_with_urls(urls: Vec<UrlRule>) -> InterceptEngine {
        let engine = InterceptEngine::new();
        engine.set_urls(urls);
        engine
    }

    #[test]
    fn test_overwrite_order_pins_the_batch_id() {
        let engine = InterceptEngine::new();

        engine.with_record_order(Some(RecordOrder::Overwrite));
        assert_eq!(
            engine.header(OVERWRITE_ID).as_deref(),
            Some(engine.overwrite_id())
        );

        engine.with_record_order(Some(RecordOrder::Append));
        assert_eq!(engine.header(RECORD_ORDER).as_deref(), Some("append"));
        assert_eq!(engine.header(OVERWRITE_ID), None);

        engine.with_record_order(None);
        assert_eq!(engine.header(RECORD_ORDER), None);
    }

    #[test]
    fn test_setter_with_none_deletes_the_header() {
        let engine = InterceptEngine::new();
        engine.with_scenario_key(Some("checkout"));
        assert_eq!(engine.header(SCENARIO_KEY).as_deref(), Some("checkout"));

        engine.with_scenario_key(None);
        assert_eq!(engine.header(SCENARIO_KEY), None);
    }

    #[test]
    fn test_enter_session_applies_merged_options_once() {
        let engine = engine_with_urls(vec![UrlRule::from("https://x/a")]);
        let options = InterceptorOptions::new()
            .with_scenario_key("checkout")
            .with_record(RecordOptions::new().with_order(RecordOrder::Overwrite));

        let session_id = engine.enter_session(&options, None).unwrap();
        assert!(!session_id.is_empty());
        assert_eq!(engine.header(SCENARIO_KEY).as_deref(), Some("checkout"));
        assert_eq!(engine.header(RECORD_ORDER).as_deref(), Some("overwrite"));
        assert_eq!(engine.header(SESSION_ID).as_deref(), Some(session_id.as_str()));
    }

    #[test]
    fn test_reentering_a_session_preserves_headers() {
        let engine = engine_with_urls(vec![UrlRule::from("https://x/a")]);
        let options = InterceptorOptions::new().with_scenario_key("first");

        let session_id = engine.enter_session(&options, None).unwrap();

        // Mutations between applies stick around.
        engine.with_scenario_key(Some("adjusted"));
        let overrides = ApplyOptions::new().with_scenario_key("second");
        let again = engine.enter_session(&options, Some(&overrides)).unwrap();

        assert_eq!(again, session_id);
        assert_eq!(engine.header(SCENARIO_KEY).as_deref(), Some("adjusted"));
    }

    #[test]
    fn test_explicit_session_id_is_used_verbatim() {
        let engine = engine_with_urls(vec![UrlRule::from("https://x/a")]);
        let options = InterceptorOptions::new().with_session_id("run-7");

        let session_id = engine.enter_session(&options, None).unwrap();
        assert_eq!(session_id, "run-7");
    }

    #[test]
    fn test_enter_session_flattens_rule_payloads() {
        let rule = UrlRule::from("https://x/a").with_match_rules(vec![MatchRule {
            modes: vec![ProxyMode::Record],
            components: vec![RequestComponent::Header],
        }]);
        let engine = engine_with_urls(vec![rule]);

        engine
            .enter_session(&InterceptorOptions::new(), None)
            .unwrap();
        assert!(engine.header(MATCH_RULES).is_some());
        assert_eq!(engine.header(REWRITE_RULES), None);
    }

    #[test]
    fn test_clear_session_returns_to_idle() {
        let engine = engine_with_urls(vec![UrlRule::from("https://x/a")]);
        engine
            .enter_session(&InterceptorOptions::new().with_scenario_key("k"), None)
            .unwrap();

        engine.clear_session();
        assert!(!engine.is_started());
        assert!(engine.headers().is_empty());

        // Idempotent.
        engine.clear_session();
        assert!(engine.headers().is_empty());
    }

    #[test]
    fn test_decorate_url_gates_on_the_allow_list() {
        let engine = engine_with_urls(vec![UrlRule::from("https://x/a")]);
        engine.with_scenario_key(Some("k"));
        let prepared = engine.prepare_rules().unwrap();
        let tracker = OverwriteTracker::snapshot(&engine.urls());

        let decorated = engine.decorate_url("https://x/a", &HashMap::new(), &prepared, &tracker);
        assert_eq!(
            decorated.unwrap().get(SCENARIO_KEY).map(String::as_str),
            Some("k")
        );

        let untouched = engine.decorate_url("https://x/b", &HashMap::new(), &prepared, &tracker);
        assert!(untouched.is_none());
    }

    #[test]
    fn test_decorate_url_attaches_first_matching_rule_payloads() {
        let broad = UrlRule::from(Regex::new(r"https://x/.*").unwrap()).with_match_rules(vec![
            MatchRule {
                modes: vec![ProxyMode::Mock],
                components: vec![RequestComponent::QueryParam],
            },
        ]);
        let narrow = UrlRule::from("https://x/a");
        let engine = engine_with_urls(vec![broad, narrow]);
        let prepared = engine.prepare_rules().unwrap();
        let tracker = OverwriteTracker::snapshot(&engine.urls());

        let headers = engine
            .decorate_url("https://x/a", &HashMap::new(), &prepared, &tracker)
            .unwrap();
        assert_eq!(
            headers.get(MATCH_RULES).map(String::as_str),
            prepared[0].match_header.as_deref()
        );
    }

    #[test]
    fn test_overwrite_id_is_stable_across_sessions() {
        let engine = engine_with_urls(vec![UrlRule::from("https://x/a")]);
        let id = engine.overwrite_id().to_string();

        engine.with_record_order(Some(RecordOrder::Overwrite));
        let first = engine.header(OVERWRITE_ID);
        engine.clear_session();
        engine.with_record_order(Some(RecordOrder::Overwrite));
        let second = engine.header(OVERWRITE_ID);

        assert_eq!(first.as_deref(), Some(id.as_str()));
        assert_eq!(first, second);
    }
}
