//! Geometry field resolvers
//!
//! A resolver extracts the geometry text of one declared field from a record.
//! `None` means "no geometry": the record leaves that field's index.

use super::{JsonPath, Record};
use crate::types::{GeometryField, SourceKind};
use crate::Result;
use serde_json::Value;

pub trait GeometryResolver: Send + Sync {
    fn resolve_geometry_text(&self, record: &Record) -> Option<String>;
}

/// Reads a named field of a hash record
#[derive(Debug, Clone)]
pub struct FlatFieldResolver {
    field: String,
}

impl FlatFieldResolver {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

impl GeometryResolver for FlatFieldResolver {
    fn resolve_geometry_text(&self, record: &Record) -> Option<String> {
        record.hash_get(&self.field).map(str::to_string)
    }
}

/// Evaluates a path expression against a JSON record
#[derive(Debug, Clone)]
pub struct PathResolver {
    path: JsonPath,
}

impl PathResolver {
    pub fn new(path: JsonPath) -> Self {
        Self { path }
    }
}

impl GeometryResolver for PathResolver {
    fn resolve_geometry_text(&self, record: &Record) -> Option<String> {
        let Record::Json(document) = record else {
            return None;
        };
        match self.path.get(document)? {
            Value::String(text) => Some(text.clone()),
            Value::Array(items) => match items.as_slice() {
                [Value::String(text)] => Some(text.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Build the resolver for a declared field
pub fn resolver_for(source: SourceKind, field: &GeometryField) -> Result<Box<dyn GeometryResolver>> {
    match source {
        SourceKind::Hash => Ok(Box::new(FlatFieldResolver::new(field.path.clone()))),
        SourceKind::Json => Ok(Box::new(PathResolver::new(JsonPath::parse(&field.path)?))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SMALL: &str = "POLYGON((1 1, 0 10, 10 10, 10 0, 1 1))";

    #[test]
    fn test_flat_field() {
        let resolver = FlatFieldResolver::new("geom");
        let record = Record::Hash(vec![("geom".into(), SMALL.into())]);
        assert_eq!(resolver.resolve_geometry_text(&record).as_deref(), Some(SMALL));

        let other = Record::Hash(vec![("shape".into(), SMALL.into())]);
        assert_eq!(resolver.resolve_geometry_text(&other), None);
        assert_eq!(resolver.resolve_geometry_text(&Record::Json(json!({"geom": SMALL}))), None);
    }

    #[test]
    fn test_path() {
        let resolver = PathResolver::new(JsonPath::parse("$.geom").unwrap());
        assert_eq!(
            resolver.resolve_geometry_text(&Record::Json(json!({"geom": SMALL}))).as_deref(),
            Some(SMALL)
        );
        assert_eq!(
            resolver.resolve_geometry_text(&Record::Json(json!({"geom": [SMALL]}))).as_deref(),
            Some(SMALL)
        );

        for doc in [
            json!({"geom": 5}),
            json!({"geom": [SMALL, SMALL]}),
            json!({"geom": {"wkt": SMALL}}),
            json!({"other": SMALL}),
        ] {
            assert_eq!(resolver.resolve_geometry_text(&Record::Json(doc)), None);
        }
        assert_eq!(
            resolver.resolve_geometry_text(&Record::Hash(vec![("geom".into(), SMALL.into())])),
            None
        );
    }

    #[test]
    fn test_resolver_for() {
        let field = GeometryField::path("$.shapes[0]", "geom");
        let resolver = resolver_for(SourceKind::Json, &field).unwrap();
        let record = Record::Json(json!({"shapes": [SMALL]}));
        assert_eq!(resolver.resolve_geometry_text(&record).as_deref(), Some(SMALL));

        assert!(resolver_for(SourceKind::Json, &GeometryField::path("$[", "geom")).is_err());
    }
}
