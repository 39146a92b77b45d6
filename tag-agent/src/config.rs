//! Remote agent configuration resources.
//!
//! Plain CRUD over the cooperating agent's HTTP API; the interceptor core
//! never touches this surface.

use crate::error::AgentResult;
use intercept_core::constants::{
    MockPolicy, ProxyMode, RecordPolicy, ReplayPolicy, TestPolicy, TestStrategy,
};
use intercept_core::rules::{RequestComponent, RewriteRule};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Full agent configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub cli: CliSettings,
    pub proxy: ProxySettings,
    pub remote: RemoteSettings,
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliSettings {
    pub features: CliFeatures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliFeatures {
    pub dev_tools: bool,
    pub exec: bool,
    pub remote: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxySettings {
    /// Per-project data rules, keyed by project id.
    #[serde(default)]
    pub data: HashMap<String, DataRules>,
    /// Per-project match rules, keyed by project id.
    #[serde(rename = "match", default)]
    pub match_rules: HashMap<String, Vec<ProjectMatchRule>>,
    /// Per-project rewrite rules, keyed by project id.
    #[serde(default)]
    pub rewrite: HashMap<String, Vec<ProjectRewriteRule>>,
    pub intercept: InterceptSettings,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_policy: Option<MockPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_policy: Option<RecordPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_policy: Option<ReplayPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_policy: Option<TestPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_strategy: Option<TestStrategy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMatchRule {
    pub components: Vec<RequestComponent>,
    pub methods: Vec<String>,
    pub modes: Vec<ProxyMode>,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRewriteRule {
    #[serde(flatten)]
    pub rule: RewriteRule,
    pub methods: Vec<String>,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptSettings {
    pub active: bool,
    pub mode: ProxyMode,
    pub project_key: String,
    pub scenario_key: String,
    pub upstream_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub api_key: String,
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    pub active: bool,
    pub url: String,
}

/// Abbreviated configuration view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub active: bool,
    pub mode: ProxyMode,
    pub project_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_key: Option<String>,
}

/// HTTP resource for the agent configuration document.
#[derive(Debug, Clone)]
pub struct ConfigResource {
    client: reqwest::Client,
    base_url: Url,
}

impl ConfigResource {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// GET the full configuration document.
    pub async fn show(&self) -> AgentResult<AgentConfig> {
        let url = self.base_url.join("api/v1/config")?;
        tracing::debug!(%url, "fetching agent config");
        let config = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(config)
    }

    /// GET the abbreviated configuration view.
    pub async fn summary(&self) -> AgentResult<ConfigSummary> {
        let url = self.base_url.join("api/v1/config/summary")?;
        let summary = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(summary)
    }
}

/// Configuration model over the resource.
#[derive(Debug, Clone)]
pub struct Config {
    resource: ConfigResource,
}

impl Config {
    pub fn new(resource: ConfigResource) -> Self {
        Self { resource }
    }

    /// Full agent configuration document.
    pub async fn dump(&self) -> AgentResult<AgentConfig> {
        self.resource.show().await
    }

    pub async fn summary(&self) -> AgentResult<ConfigSummary> {
        self.resource.summary().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_document_deserializes() {
        let document = r#"{
            "cli": {"features": {"dev_tools": true, "exec": false, "remote": true}},
            "proxy": {
                "data": {"p1": {"record_policy": "not_found", "scenario_key": "checkout"}},
                "match": {"p1": [{"components": ["query_param"], "methods": ["GET"], "modes": ["record"], "pattern": "/api/.*"}]},
                "rewrite": {},
                "intercept": {
                    "active": true,
                    "mode": "record",
                    "project_key": "p1",
                    "scenario_key": "checkout",
                    "upstream_url": "https://upstream.example.com"
                },
                "url": "http://localhost:8080"
            },
            "remote": {"api_key": "k", "api_url": "https://api.example.com"},
            "ui": {"active": false, "url": "http://localhost:4200"}
        }"#;

        let config: AgentConfig = serde_json::from_str(document).unwrap();
        assert!(config.proxy.intercept.active);
        assert_eq!(config.proxy.intercept.mode, ProxyMode::Record);

        let data = config.proxy.data.get("p1").unwrap();
        assert_eq!(data.record_policy, Some(RecordPolicy::NotFound));
        assert_eq!(data.scenario_key.as_deref(), Some("checkout"));

        let match_rules = config.proxy.match_rules.get("p1").unwrap();
        assert_eq!(match_rules[0].components, vec![RequestComponent::QueryParam]);
    }

    #[test]
    fn test_summary_round_trips() {
        let summary = ConfigSummary {
            active: true,
            mode: ProxyMode::Mock,
            project_key: "p1".to_string(),
            scenario_key: None,
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("scenario_key"));

        let back: ConfigSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mode, ProxyMode::Mock);
    }
}
