//! Payload normalization.
//!
//! Maps any fetched JSON payload into canonical [`Record`]s. Arrays fan out
//! into one record per element; anything else is a single source item.
//! Objects contribute their `timestamp` and `value` fields when present;
//! every other shape is stored as-is with no timestamp.

use serde_json::{Map, Value};

use crate::models::{Payload, Record};

/// Normalize one payload fetched from `kind` on `service_id`.
///
/// Never fails: every well-formed JSON value maps to zero or more records,
/// in source order. An empty array yields no records.
pub fn normalize(service_id: &str, kind: &str, payload: Value) -> Vec<Record> {
    match Payload::from(payload) {
        Payload::Sequence(items) => items
            .into_iter()
            .map(|item| normalize_item(service_id, kind, item))
            .collect(),
        Payload::Keyed(map) => vec![from_keyed(service_id, kind, map)],
        Payload::Scalar(value) => vec![bare(service_id, kind, value)],
    }
}

/// A single element of a sequence. Nested arrays are not flattened.
fn normalize_item(service_id: &str, kind: &str, item: Value) -> Record {
    match item {
        Value::Object(map) => from_keyed(service_id, kind, map),
        other => bare(service_id, kind, other),
    }
}

fn from_keyed(service_id: &str, kind: &str, mut map: Map<String, Value>) -> Record {
    let timestamp = map.get("timestamp").and_then(timestamp_text);
    let value = match map.remove("value") {
        Some(v) => v,
        None => Value::Object(map),
    };

    Record {
        service_id: service_id.to_string(),
        kind: kind.to_string(),
        timestamp,
        value,
    }
}

fn bare(service_id: &str, kind: &str, value: Value) -> Record {
    Record {
        service_id: service_id.to_string(),
        kind: kind.to_string(),
        timestamp: None,
        value,
    }
}

/// Strings are taken verbatim, `null` counts as absent, and any other value
/// uses its compact JSON text.
fn timestamp_text(raw: &Value) -> Option<String> {
    match raw {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
