//! Origin path to final relative path mapping

use std::collections::BTreeMap;

/// Maps each path literal found in a generated document to its final
/// `resources/`-relative location
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMapping {
    entries: BTreeMap<String, String>,
}

impl PathMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; an existing entry for the same origin is kept
    pub fn insert(&mut self, origin: impl Into<String>, mapped: impl Into<String>) {
        self.entries.entry(origin.into()).or_insert_with(|| mapped.into());
    }

    pub fn get(&self, origin: &str) -> Option<&str> {
        self.entries.get(origin).map(String::as_str)
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.entries.contains_key(origin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
