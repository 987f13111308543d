//! Core data models used throughout bus-harvest.
//!
//! [`Record`] is the only type that outlives a discovery pass. [`Service`],
//! [`Capabilities`] and [`Endpoint`] mirror the bus protocol and are dropped
//! once the pass that fetched them finishes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical record produced by the normalizer and held in the store.
///
/// Serialized with the short `t` / `v` keys that the query API exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Id of the service the record was fetched from.
    pub service_id: String,
    /// Relation name of the capability that produced the record.
    pub kind: String,
    /// String form of the source item's `timestamp` field, if it had one.
    #[serde(rename = "t")]
    pub timestamp: Option<String>,
    /// The source item's `value` field, or the whole item.
    #[serde(rename = "v")]
    pub value: Value,
}

/// One entry of the bus service list.
#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub id: String,
}

/// Capability descriptor advertised by a single service.
///
/// Entries stay raw until the walker reaches them, so a malformed entry
/// only fails once every entry ahead of it has been processed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Capabilities {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub endpoints: Vec<Value>,
}

/// A relation name plus the address its data can be fetched from.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub rel: String,
    pub href: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A fetched payload, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A JSON array; every element is one source item.
    Sequence(Vec<Value>),
    /// A JSON object.
    Keyed(Map<String, Value>),
    /// Null, boolean, number or string.
    Scalar(Value),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Payload::Sequence(items),
            Value::Object(map) => Payload::Keyed(map),
            other => Payload::Scalar(other),
        }
    }
}
