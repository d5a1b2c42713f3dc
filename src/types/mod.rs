//! Data types for geosearch

mod spatial;
mod schema;

pub use spatial::{BoundingBox, Point, Polygon};
pub use schema::{GeometryField, IndexSchema, SourceKind};

/// Record identifier (the external key of a record)
pub type RecordId = String;
