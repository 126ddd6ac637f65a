//! Domain types for the record store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, namespaced record holding string data plus string annotations.
///
/// `version` is owned by the store: zero for a record that has never been
/// written, otherwise the value the store assigned on the last write.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusRecord {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub version: u64,
}

impl StatusRecord {
    /// An empty, never-written record.
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Build the composite key for the records table.
    pub fn table_key(&self) -> String {
        record_key(&self.namespace, &self.name)
    }
}

/// Composite key `{namespace}/{name}`.
pub fn record_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}
