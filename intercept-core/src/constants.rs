//! Signaling header names and proxy control vocabularies.
//!
//! Header names are configuration constants; the cooperating proxy treats
//! them as case-insensitive wire names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Test identity, resolved from the harness when not set explicitly.
pub const TEST_NAME: &str = "x-test-name";
/// Proxy operating mode ("record" while recording).
pub const PROXY_MODE: &str = "x-proxy-mode";
/// Whether recorded traffic replaces or extends existing scenario data.
pub const RECORD_ORDER: &str = "x-record-order";
/// Which requests the proxy should persist.
pub const RECORD_POLICY: &str = "x-record-policy";
/// How much of each request the proxy should persist.
pub const RECORD_STRATEGY: &str = "x-record-strategy";
/// Scenario selection by key.
pub const SCENARIO_KEY: &str = "x-scenario-key";
/// Scenario selection by name.
pub const SCENARIO_NAME: &str = "x-scenario-name";
/// Stable identity of one logical test run.
pub const SESSION_ID: &str = "x-session-id";
/// Base64 JSON match rule payload.
pub const MATCH_RULES: &str = "x-match-rules";
/// Base64 JSON rewrite rule payload.
pub const REWRITE_RULES: &str = "x-rewrite-rules";
/// Correlates all overwrite-mode requests of one interceptor instance.
pub const OVERWRITE_ID: &str = "x-overwrite-id";

/// Every signaling header the engine may attach.
pub const SIGNALING_HEADERS: &[&str] = &[
    TEST_NAME,
    PROXY_MODE,
    RECORD_ORDER,
    RECORD_POLICY,
    RECORD_STRATEGY,
    SCENARIO_KEY,
    SCENARIO_NAME,
    SESSION_ID,
    MATCH_RULES,
    REWRITE_RULES,
    OVERWRITE_ID,
];

/// Proxy operating mode carried by the proxy-mode header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyMode {
    Mock,
    Record,
    Replay,
    Test,
}

impl ProxyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyMode::Mock => "mock",
            ProxyMode::Record => "record",
            ProxyMode::Replay => "replay",
            ProxyMode::Test => "test",
        }
    }
}

impl fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether recorded traffic replaces or extends existing scenario data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrder {
    Append,
    Overwrite,
}

impl RecordOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordOrder::Append => "append",
            RecordOrder::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for RecordOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which requests the proxy should persist while recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPolicy {
    All,
    Found,
    NotFound,
}

impl RecordPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordPolicy::All => "all",
            RecordPolicy::Found => "found",
            RecordPolicy::NotFound => "not_found",
        }
    }
}

impl fmt::Display for RecordPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of each exchange the proxy should persist while recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStrategy {
    Full,
    Minimal,
}

impl RecordStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStrategy::Full => "full",
            RecordStrategy::Minimal => "minimal",
        }
    }
}

impl fmt::Display for RecordStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which requests the proxy serves from recorded data while mocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockPolicy {
    All,
    Found,
}

/// Which requests the proxy replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPolicy {
    All,
}

/// Which requests the proxy evaluates in test mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestPolicy {
    All,
    Found,
}

/// Response comparison strategy in test mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStrategy {
    Diff,
    Fuzzy,
    Custom,
}
