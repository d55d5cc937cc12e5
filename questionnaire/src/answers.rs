//! Ordinal-keyed answer storage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from question ordinal to the raw answer string.
///
/// Holds exactly one value per key; recording again replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap {
    entries: BTreeMap<usize, String>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `ordinal`, returning the value it replaced.
    pub fn record(&mut self, ordinal: usize, value: impl Into<String>) -> Option<String> {
        self.entries.insert(ordinal, value.into())
    }

    pub fn get(&self, ordinal: usize) -> Option<&str> {
        self.entries.get(&ordinal).map(String::as_str)
    }

    pub fn contains(&self, ordinal: usize) -> bool {
        self.entries.contains_key(&ordinal)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Answers in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (usize, S)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (ordinal, value) in iter {
            map.record(ordinal, value);
        }
        map
    }
}
