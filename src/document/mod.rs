//! Record layer
//!
//! Records come in two shapes: flat hashes (ordered field/value pairs) and
//! JSON documents. Resolvers pull geometry text out of either shape.

pub mod json_path;
pub mod resolver;

pub use json_path::{JsonPath, PathSegment};
pub use resolver::{resolver_for, FlatFieldResolver, GeometryResolver, PathResolver};

use crate::types::SourceKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    /// Field/value pairs in insertion order
    Hash(Vec<(String, String)>),
    Json(Value),
}

impl Record {
    pub fn kind(&self) -> SourceKind {
        match self {
            Record::Hash(_) => SourceKind::Hash,
            Record::Json(_) => SourceKind::Json,
        }
    }

    pub fn hash_get(&self, field: &str) -> Option<&str> {
        match self {
            Record::Hash(fields) => fields
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, value)| value.as_str()),
            Record::Json(_) => None,
        }
    }

    /// Set a hash field in place; returns `true` if the field is new.
    /// No-op on JSON records.
    pub fn hash_set(&mut self, field: &str, value: &str) -> bool {
        let Record::Hash(fields) = self else {
            return false;
        };
        match fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, existing)) => {
                *existing = value.to_string();
                false
            }
            None => {
                fields.push((field.to_string(), value.to_string()));
                true
            }
        }
    }

    /// Remove a hash field; returns whether it existed
    pub fn hash_del(&mut self, field: &str) -> bool {
        let Record::Hash(fields) = self else {
            return false;
        };
        let before = fields.len();
        fields.retain(|(name, _)| name != field);
        fields.len() != before
    }

    /// Hash record with no fields left
    pub fn is_empty_hash(&self) -> bool {
        matches!(self, Record::Hash(fields) if fields.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_ops() {
        let mut record = Record::Hash(Vec::new());
        assert!(record.hash_set("geom", "POLYGON((0 0, 1 0, 1 1, 0 0))"));
        assert!(record.hash_set("name", "a"));
        assert!(!record.hash_set("geom", "POLYGON((0 0, 2 0, 2 2, 0 0))"));

        assert_eq!(record.hash_get("geom"), Some("POLYGON((0 0, 2 0, 2 2, 0 0))"));
        // insertion order survives overwrites
        match &record {
            Record::Hash(fields) => assert_eq!(fields[0].0, "geom"),
            _ => unreachable!(),
        }

        assert!(record.hash_del("geom"));
        assert!(!record.hash_del("geom"));
        assert!(record.hash_del("name"));
        assert!(record.is_empty_hash());
    }

    #[test]
    fn test_json_record_ignores_hash_ops() {
        let mut record = Record::Json(json!({"geom": "x"}));
        assert_eq!(record.kind(), SourceKind::Json);
        assert!(!record.hash_set("geom", "y"));
        assert_eq!(record.hash_get("geom"), None);
        assert!(!record.is_empty_hash());
    }
}
