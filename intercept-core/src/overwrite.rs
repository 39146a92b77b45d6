//! One-shot overwrite header suppression.

use crate::constants::{RecordOrder, OVERWRITE_ID, RECORD_ORDER};
use crate::matcher::{UrlPattern, UrlRule};
use std::collections::HashMap;
use std::sync::Mutex;

/// Request side of an overwrite check: a literal URL for client transports, a
/// configured pattern for route-registration transports.
#[derive(Debug, Clone, Copy)]
pub enum RequestSubject<'a> {
    Url(&'a str),
    Pattern(&'a UrlPattern),
}

/// Patterns not yet seen within one decoration cycle.
///
/// Captured fresh every time transport hooks are (re)installed and shared by
/// every hook of that cycle; the set only shrinks within a cycle. The
/// overwrite signal must reach the proxy exactly once per configured pattern
/// per cycle, regardless of which transport carries the matching request.
#[derive(Debug)]
pub struct OverwriteTracker {
    remaining: Mutex<Vec<UrlPattern>>,
}

impl OverwriteTracker {
    /// Snapshot the configured pattern list for a new decoration cycle.
    pub fn snapshot(rules: &[UrlRule]) -> Self {
        Self {
            remaining: Mutex::new(rules.iter().map(|rule| rule.pattern.clone()).collect()),
        }
    }

    /// Patterns still eligible for the overwrite signal this cycle.
    pub fn remaining(&self) -> usize {
        self.remaining.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Removes the first remaining pattern covering the subject, leaving the
    /// headers untouched (first request to that pattern); when no remaining
    /// pattern covers it, strips the one-shot overwrite headers instead.
    pub fn filter(&self, headers: &mut HashMap<String, String>, subject: RequestSubject<'_>) {
        if headers.get(RECORD_ORDER).map(String::as_str) != Some(RecordOrder::Overwrite.as_str()) {
            return;
        }

        let mut remaining = self.remaining.lock().unwrap_or_else(|e| e.into_inner());
        match remaining.iter().position(|pattern| covers(pattern, subject)) {
            Some(index) => {
                remaining.remove(index);
            }
            None => {
                headers.remove(RECORD_ORDER);
                headers.remove(OVERWRITE_ID);
            }
        }
    }
}

/// Equivalence between a tracked pattern and a request subject.
///
/// Route transports surface the registered pattern itself, where regex
/// identity is source equality; client transports surface the literal URL.
fn covers(pattern: &UrlPattern, subject: RequestSubject<'_>) -> bool {
    match (pattern, subject) {
        (UrlPattern::Regex(have), RequestSubject::Pattern(UrlPattern::Regex(want))) => {
            have.as_str() == want.as_str()
        }
        (UrlPattern::Regex(regex), RequestSubject::Url(url)) => regex.is_match(url),
        (UrlPattern::Exact(have), RequestSubject::Url(url)) => have == url,
        (UrlPattern::Exact(have), RequestSubject::Pattern(UrlPattern::Exact(want))) => {
            have == want
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn overwrite_headers() -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(RECORD_ORDER.to_string(), "overwrite".to_string());
        headers.insert(OVERWRITE_ID.to_string(), "batch-1".to_string());
        headers
    }

    #[test]
    fn test_first_request_per_pattern_keeps_overwrite_headers() {
        let rules = vec![UrlRule::from("https://x/a"), UrlRule::from("https://x/b")];
        let tracker = OverwriteTracker::snapshot(&rules);

        let mut headers = overwrite_headers();
        tracker.filter(&mut headers, RequestSubject::Url("https://x/a"));
        assert!(headers.contains_key(RECORD_ORDER));
        assert!(headers.contains_key(OVERWRITE_ID));
        assert_eq!(tracker.remaining(), 1);
    }

    #[test]
    fn test_second_request_to_same_pattern_is_stripped() {
        let rules = vec![UrlRule::from("https://x/a")];
        let tracker = OverwriteTracker::snapshot(&rules);

        let mut first = overwrite_headers();
        tracker.filter(&mut first, RequestSubject::Url("https://x/a"));

        let mut second = overwrite_headers();
        tracker.filter(&mut second, RequestSubject::Url("https://x/a"));
        assert!(!second.contains_key(RECORD_ORDER));
        assert!(!second.contains_key(OVERWRITE_ID));
    }

    #[test]
    fn test_tracking_is_per_pattern_not_per_url() {
        // Two different URLs under one regex pattern: only the first carries
        // the overwrite signal.
        let rules = vec![UrlRule::from(Regex::new(r"/api/.*").unwrap())];
        let tracker = OverwriteTracker::snapshot(&rules);

        let mut first = overwrite_headers();
        tracker.filter(&mut first, RequestSubject::Url("/api/users"));
        assert!(first.contains_key(RECORD_ORDER));

        let mut second = overwrite_headers();
        tracker.filter(&mut second, RequestSubject::Url("/api/posts"));
        assert!(!second.contains_key(RECORD_ORDER));
        assert!(!second.contains_key(OVERWRITE_ID));
    }

    #[test]
    fn test_pattern_subject_matches_by_regex_source() {
        let rules = vec![UrlRule::from(Regex::new(r"/api/.*").unwrap())];
        let tracker = OverwriteTracker::snapshot(&rules);

        let registered = UrlPattern::Regex(Regex::new(r"/api/.*").unwrap());
        let mut headers = overwrite_headers();
        tracker.filter(&mut headers, RequestSubject::Pattern(&registered));
        assert!(headers.contains_key(RECORD_ORDER));
        assert_eq!(tracker.remaining(), 0);
    }

    #[test]
    fn test_non_overwrite_requests_are_untouched() {
        let rules = vec![UrlRule::from("https://x/a")];
        let tracker = OverwriteTracker::snapshot(&rules);

        let mut headers = HashMap::new();
        headers.insert(RECORD_ORDER.to_string(), "append".to_string());
        tracker.filter(&mut headers, RequestSubject::Url("https://x/a"));

        assert_eq!(headers.get(RECORD_ORDER).map(String::as_str), Some("append"));
        // Append requests never consume a pattern.
        assert_eq!(tracker.remaining(), 1);
    }

    #[test]
    fn test_fresh_snapshot_restores_first_request_behavior() {
        let rules = vec![UrlRule::from("https://x/a")];
        let tracker = OverwriteTracker::snapshot(&rules);

        let mut headers = overwrite_headers();
        tracker.filter(&mut headers, RequestSubject::Url("https://x/a"));
        assert_eq!(tracker.remaining(), 0);

        // A new decoration cycle takes a new snapshot.
        let tracker = OverwriteTracker::snapshot(&rules);
        let mut headers = overwrite_headers();
        tracker.filter(&mut headers, RequestSubject::Url("https://x/a"));
        assert!(headers.contains_key(RECORD_ORDER));
    }
}
