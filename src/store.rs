//! In-memory record store.
//!
//! A single `Vec<Record>` behind one `parking_lot::RwLock`, shared by handle
//! between the scheduler (the only writer) and the query server (readers
//! and the clearer). Insertion order is preserved and nothing is ever
//! deduplicated. Contents are lost when the process exits.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::Record;

/// Cheaply clonable handle to the shared record collection.
#[derive(Clone, Default)]
pub struct RecordStore {
    inner: Arc<RwLock<Vec<Record>>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of records under one write lock, so readers see either
    /// none or all of the batch.
    pub fn append(&self, records: Vec<Record>) {
        if records.is_empty() {
            return;
        }
        self.inner.write().extend(records);
    }

    /// Snapshot of every record in insertion order.
    pub fn list_all(&self) -> Vec<Record> {
        self.inner.read().clone()
    }

    /// Records whose `kind` equals `kind` exactly, in insertion order.
    pub fn list_by_kind(&self, kind: &str) -> Vec<Record> {
        self.inner
            .read()
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    /// Drop every record. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut records = self.inner.write();
        let removed = records.len();
        records.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(service_id: &str, kind: &str, value: i64) -> Record {
        Record {
            service_id: service_id.to_string(),
            kind: kind.to_string(),
            timestamp: None,
            value: json!(value),
        }
    }

    #[test]
    fn test_list_by_kind_keeps_relative_order() {
        let store = RecordStore::new();
        store.append(vec![record("a", "x", 1), record("a", "y", 2)]);
        store.append(vec![record("b", "x", 3)]);

        let xs = store.list_by_kind("x");
        assert_eq!(xs.len(), 2);
        assert_eq!(xs[0].value, json!(1));
        assert_eq!(xs[1].value, json!(3));
    }

    #[test]
    fn test_list_by_kind_is_exact_match() {
        let store = RecordStore::new();
        store.append(vec![record("a", "telemetry", 1), record("a", "tele", 2)]);

        assert_eq!(store.list_by_kind("tele").len(), 1);
        assert!(store.list_by_kind("tele*").is_empty());
        assert!(store.list_by_kind("Telemetry").is_empty());
    }

    #[test]
    fn test_clear_empties_store() {
        let store = RecordStore::new();
        store.append(vec![record("a", "x", 1), record("b", "y", 2)]);

        assert_eq!(store.clear(), 2);
        assert!(store.list_all().is_empty());
        assert!(store.is_empty());

        // Clearing an empty store is fine too.
        assert_eq!(store.clear(), 0);
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let store = RecordStore::new();
        store.append(vec![record("a", "x", 1)]);
        store.append(vec![record("a", "x", 1)]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clones_share_contents() {
        let store = RecordStore::new();
        let reader = store.clone();
        store.append(vec![record("a", "x", 1)]);
        assert_eq!(reader.list_all().len(), 1);
        reader.clear();
        assert!(store.is_empty());
    }
}
