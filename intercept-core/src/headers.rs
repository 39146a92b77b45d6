//! Signaling header state.

use crate::constants::TEST_NAME;
use crate::detect;
use std::collections::HashMap;

/// Mapping of signaling header names to values.
///
/// A header is present iff its setter was last called with a value; setting
/// `None` deletes it.
#[derive(Debug, Clone, Default)]
pub struct HeaderState {
    entries: HashMap<String, String>,
}

impl HeaderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&mut self, name: &str, value: Option<String>) {
        match value {
            Some(value) => {
                self.entries.insert(name.to_string(), value);
            }
            None => {
                self.entries.remove(name);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.entries.clone()
    }

    /// Merges caller headers with signaling headers; signaling headers win on
    /// collisions. A dynamically detected test name is added only when none
    /// was set explicitly. Neither input is mutated.
    pub fn compute(&self, initial: &HashMap<String, String>) -> HashMap<String, String> {
        let mut headers = initial.clone();
        headers.extend(
            self.entries
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );

        if !self.entries.contains_key(TEST_NAME) {
            if let Some(name) = detect::test_name() {
                headers.insert(TEST_NAME.to_string(), name);
            }
        }

        headers
    }
}
