//! URL allow-list matching.

use crate::rules::{MatchRule, RewriteRule};
use regex::Regex;
use std::fmt;

/// A configured URL pattern: exact string or regular expression.
///
/// A caller-supplied regex is held as a value object; matching through
/// [`Regex::is_match`] carries no scan position, so repeated attempts against
/// the same pattern can never corrupt each other.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    Exact(String),
    Regex(Regex),
}

impl UrlPattern {
    /// True if the candidate URL is covered by this pattern.
    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlPattern::Exact(exact) => exact == url,
            UrlPattern::Regex(regex) => regex.is_match(url),
        }
    }

    /// Stable key used for handler maps and pattern identity checks.
    pub fn key(&self) -> &str {
        match self {
            UrlPattern::Exact(exact) => exact,
            UrlPattern::Regex(regex) => regex.as_str(),
        }
    }
}

impl PartialEq for UrlPattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UrlPattern::Exact(a), UrlPattern::Exact(b)) => a == b,
            (UrlPattern::Regex(a), UrlPattern::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl From<&str> for UrlPattern {
    fn from(url: &str) -> Self {
        UrlPattern::Exact(url.to_string())
    }
}

impl From<String> for UrlPattern {
    fn from(url: String) -> Self {
        UrlPattern::Exact(url)
    }
}

impl From<Regex> for UrlPattern {
    fn from(regex: Regex) -> Self {
        UrlPattern::Regex(regex)
    }
}

/// A URL pattern plus the rule payloads attached to requests it matches.
#[derive(Debug, Clone)]
pub struct UrlRule {
    pub pattern: UrlPattern,
    pub match_rules: Vec<MatchRule>,
    pub rewrite_rules: Vec<RewriteRule>,
}

impl UrlRule {
    pub fn new(pattern: impl Into<UrlPattern>) -> Self {
        Self {
            pattern: pattern.into(),
            match_rules: Vec::new(),
            rewrite_rules: Vec::new(),
        }
    }

    pub fn with_match_rules(mut self, rules: Vec<MatchRule>) -> Self {
        self.match_rules = rules;
        self
    }

    pub fn with_rewrite_rules(mut self, rules: Vec<RewriteRule>) -> Self {
        self.rewrite_rules = rules;
        self
    }
}

impl From<&str> for UrlRule {
    fn from(url: &str) -> Self {
        UrlRule::new(url)
    }
}

impl From<String> for UrlRule {
    fn from(url: String) -> Self {
        UrlRule::new(url)
    }
}

impl From<Regex> for UrlRule {
    fn from(regex: Regex) -> Self {
        UrlRule::new(regex)
    }
}

impl From<UrlPattern> for UrlRule {
    fn from(pattern: UrlPattern) -> Self {
        UrlRule::new(pattern)
    }
}

/// First configured rule whose pattern covers the URL, in caller list order.
///
/// The first match decides which per-pattern rule payloads a request carries.
pub fn first_match<'a>(url: &str, rules: &'a [UrlRule]) -> Option<&'a UrlRule> {
    rules.iter().find(|rule| rule.pattern.matches(url))
}

/// True if any configured rule covers the URL.
pub fn is_allowed(url: &str, rules: &[UrlRule]) -> bool {
    first_match(url, rules).is_some()
}
