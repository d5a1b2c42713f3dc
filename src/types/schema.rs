/// Index schema definitions: which record fields carry geometry
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of the records an index reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SourceKind {
    /// Flat field-value records
    #[default]
    Hash,
    /// Nested JSON documents addressed by path expressions
    Json,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Hash => f.write_str("HASH"),
            SourceKind::Json => f.write_str("JSON"),
        }
    }
}

/// Geometry-typed field declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryField {
    /// Field name (hash) or path expression (JSON)
    pub path: String,
    /// Name used in queries (`@alias:[...]`) and results
    pub alias: String,
}

impl GeometryField {
    /// Hash field addressed by its name
    pub fn flat(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            alias: name,
        }
    }

    /// JSON field addressed by a path, queried under `alias`
    pub fn path(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: alias.into(),
        }
    }
}

/// Index schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Index name (unique in the database)
    pub name: String,
    /// Record shape
    pub source: SourceKind,
    /// Key prefixes this index covers (empty = every key)
    pub prefixes: Vec<String>,
    /// Geometry field declarations
    pub fields: Vec<GeometryField>,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>, source: SourceKind) -> Self {
        Self {
            name: name.into(),
            source,
            prefixes: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    pub fn with_field(mut self, field: GeometryField) -> Self {
        self.fields.push(field);
        self
    }

    /// Whether a record key falls under this index
    pub fn covers_key(&self, key: &str) -> bool {
        self.prefixes.is_empty() || self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    /// Validate the declaration (paths are checked when resolvers are built)
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("index name must not be empty".to_string());
        }
        if self.fields.is_empty() {
            return Err(format!("index '{}' declares no fields", self.name));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if field.alias.is_empty() || field.path.is_empty() {
                return Err(format!("field #{} has an empty name", i));
            }
            // `@alias:[...]` only accepts word characters
            if !field.alias.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(format!("field alias '{}' must be letters, digits or '_'", field.alias));
            }
            if self.fields[..i].iter().any(|f| f.alias == field.alias) {
                return Err(format!("duplicate field '{}'", field.alias));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_key() {
        let schema = IndexSchema::new("idx", SourceKind::Hash).with_field(GeometryField::flat("geom"));
        assert!(schema.covers_key("anything"));

        let schema = schema.with_prefix("shape:").with_prefix("zone:");
        assert!(schema.covers_key("shape:1"));
        assert!(schema.covers_key("zone:x"));
        assert!(!schema.covers_key("small"));
    }

    #[test]
    fn test_validate() {
        let empty = IndexSchema::new("idx", SourceKind::Json);
        assert!(empty.validate().is_err());

        let dup = IndexSchema::new("idx", SourceKind::Json)
            .with_field(GeometryField::path("$.a", "geom"))
            .with_field(GeometryField::path("$.b", "geom"));
        assert!(dup.validate().unwrap_err().contains("duplicate"));

        let ok = IndexSchema::new("idx", SourceKind::Json).with_field(GeometryField::path("$.geom", "geom"));
        assert!(ok.validate().is_ok());

        let raw_path = IndexSchema::new("idx", SourceKind::Json).with_field(GeometryField::path("$.geom", "$.geom"));
        assert!(raw_path.validate().unwrap_err().contains("alias"));
    }
}
