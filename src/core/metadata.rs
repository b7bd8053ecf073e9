//! Optional per-record metadata kept beside the core record.
//!
//! Fields such as mood, location, tags or private notes live here rather than on
//! `LeaveRecord`, so schema churn in these extras never touches reconciliation or
//! calendar queries. The document carries its own schema version.

use crate::core::leave::LeaveId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Schema version written with every metadata document.
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// Arbitrary key/value extras for one record.
pub type LeaveMetadata = BTreeMap<String, Value>;

/// Side-map of metadata keyed by record id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataMap {
    /// Layout version of this document
    pub schema_version: u32,
    /// Extras per record
    #[serde(default)]
    pub entries: BTreeMap<LeaveId, LeaveMetadata>,
}

impl Default for MetadataMap {
    fn default() -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl MetadataMap {
    /// Extras stored for `id`.
    #[must_use]
    pub fn get(&self, id: &LeaveId) -> Option<&LeaveMetadata> {
        self.entries.get(id)
    }

    /// Sets one field; a `null` value removes it.
    pub fn set(&mut self, id: &LeaveId, key: &str, value: Value) {
        if value.is_null() {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.remove(key);
                if entry.is_empty() {
                    self.entries.remove(id);
                }
            }
            return;
        }

        self.entries
            .entry(id.clone())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Drops everything stored for `id`. Returns whether anything was removed.
    pub fn remove_record(&mut self, id: &LeaveId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Keeps only entries whose id satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&LeaveId) -> bool) {
        self.entries.retain(|id, _| keep(id));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_clear_fields() {
        let mut map = MetadataMap::default();
        let id = LeaveId::from("1");

        map.set(&id, "mood", json!("good"));
        map.set(&id, "tags", json!(["family", "travel"]));
        assert_eq!(map.get(&id).unwrap().len(), 2);

        map.set(&id, "mood", Value::Null);
        assert_eq!(map.get(&id).unwrap().len(), 1);

        map.set(&id, "tags", Value::Null);
        assert!(map.get(&id).is_none());
    }

    #[test]
    fn test_document_shape() {
        let mut map = MetadataMap::default();
        map.set(&LeaveId::from("abc"), "location", json!("Port Louis"));

        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert_eq!(value["entries"]["abc"]["location"], "Port Louis");

        let back: MetadataMap = serde_json::from_value(value).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_retain_and_remove() {
        let mut map = MetadataMap::default();
        map.set(&LeaveId::from("a"), "notes", json!("x"));
        map.set(&LeaveId::from("b"), "notes", json!("y"));

        map.retain(|id| id.as_str() == "a");
        assert!(map.get(&LeaveId::from("b")).is_none());

        assert!(map.remove_record(&LeaveId::from("a")));
        assert!(!map.remove_record(&LeaveId::from("a")));
    }
}
