//! Caller-facing configuration for interceptor construction.

use crate::constants::{RecordOrder, RecordPolicy, RecordStrategy};
use crate::matcher::UrlRule;

/// Transport family an interceptor should bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framework {
    /// Tagged async/blocking HTTP clients (default).
    #[default]
    Client,
    /// Page/context route registration.
    Browser,
    /// Test-harness intercept registrar.
    Harness,
}

/// Recording behavior forwarded to the proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordOptions {
    pub order: Option<RecordOrder>,
    pub policy: Option<RecordPolicy>,
    pub strategy: Option<RecordStrategy>,
}

impl RecordOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: RecordOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_policy(mut self, policy: RecordPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_strategy(mut self, strategy: RecordStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

/// Options fixed at interceptor construction.
#[derive(Debug, Clone, Default)]
pub struct InterceptorOptions {
    pub urls: Vec<UrlRule>,
    /// Mutually exclusive with `scenario_name` by convention; callers manage
    /// the exclusivity, the engine does not enforce it.
    pub scenario_key: Option<String>,
    pub scenario_name: Option<String>,
    pub session_id: Option<String>,
    pub record: Option<RecordOptions>,
    pub framework: Option<Framework>,
}

impl InterceptorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, rule: impl Into<UrlRule>) -> Self {
        self.urls.push(rule.into());
        self
    }

    pub fn with_urls(mut self, rules: Vec<UrlRule>) -> Self {
        self.urls = rules;
        self
    }

    pub fn with_scenario_key(mut self, key: impl Into<String>) -> Self {
        self.scenario_key = Some(key.into());
        self
    }

    pub fn with_scenario_name(mut self, name: impl Into<String>) -> Self {
        self.scenario_name = Some(name.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_record(mut self, record: RecordOptions) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_framework(mut self, framework: Framework) -> Self {
        self.framework = Some(framework);
        self
    }
}

/// Per-apply overrides; `Some` fields replace the constructor options for the
/// session being started.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub urls: Option<Vec<UrlRule>>,
    pub scenario_key: Option<String>,
    pub scenario_name: Option<String>,
    pub session_id: Option<String>,
    pub record: Option<RecordOptions>,
}

impl ApplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_urls(mut self, rules: Vec<UrlRule>) -> Self {
        self.urls = Some(rules);
        self
    }

    pub fn with_scenario_key(mut self, key: impl Into<String>) -> Self {
        self.scenario_key = Some(key.into());
        self
    }

    pub fn with_scenario_name(mut self, name: impl Into<String>) -> Self {
        self.scenario_name = Some(name.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_record(mut self, record: RecordOptions) -> Self {
        self.record = Some(record);
        self
    }
}
