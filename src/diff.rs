//! Shallow key-level comparison between current and desired state

use serde_json::{Map, Value};

/// Top-level keys whose desired value differs from the current one
///
/// Holds the desired values for exactly those keys, so it can be sent as a
/// partial update payload as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
    changes: Map<String, Value>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.changes.keys()
    }

    pub fn changes(&self) -> &Map<String, Value> {
        &self.changes
    }

    pub fn into_changes(self) -> Map<String, Value> {
        self.changes
    }
}

/// Compare `desired` against `current`, considering only keys of `desired`
///
/// Values are compared structurally; a key missing from `current` always
/// counts as a difference. Keys present only in `current` are ignored.
pub fn diff(current: &Map<String, Value>, desired: &Map<String, Value>) -> DiffResult {
    let changes = desired
        .iter()
        .filter(|(key, wanted)| current.get(key.as_str()) != Some(*wanted))
        .map(|(key, wanted)| (key.clone(), wanted.clone()))
        .collect();

    DiffResult { changes }
}
