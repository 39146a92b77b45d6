//! Match and rewrite rule payloads forwarded to the proxy.
//!
//! Rules ride along as base64-encoded JSON headers; the proxy, not this
//! layer, interprets them. Field names serialize to snake_case.

use crate::constants::ProxyMode;
use crate::error::InterceptResult;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Request component a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestComponent {
    Header,
    BodyParam,
    QueryParam,
}

/// Tells the proxy which request components participate in request matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRule {
    pub modes: Vec<ProxyMode>,
    pub components: Vec<RequestComponent>,
}

/// URL portion rewrite the proxy applies before matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlRewriteRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modes: Option<Vec<ProxyMode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Parameter-level rewrite the proxy applies before matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterRule {
    #[serde(rename = "type")]
    pub kind: RequestComponent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modes: Option<Vec<ProxyMode>>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Rewrite rule payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewriteRule {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub url_rules: Vec<UrlRewriteRule>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameter_rules: Vec<ParameterRule>,
}

/// Serializes rules to JSON and base64-encodes the document.
///
/// Returns `None` for an empty slice so callers delete the header instead of
/// sending an encoded empty list.
pub fn encode_rules<T: Serialize>(rules: &[T]) -> InterceptResult<Option<String>> {
    if rules.is_empty() {
        return Ok(None);
    }
    let json = serde_json::to_string(rules)?;
    Ok(Some(BASE64.encode(json)))
}
