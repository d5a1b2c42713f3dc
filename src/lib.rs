//! geosearch
//!
//! Geometry-typed secondary index for a document search engine.
//!
//! ## Features
//! - WKT `POLYGON((...))` parsing with configurable ring validation
//! - R*-tree spatial index answering "within" and "contains" queries
//! - Hash and JSON records, indexed through declared geometry fields
//!
//! ## Architecture
//! - Geometry layer: WKT parser + exact boundary-inclusive predicates
//! - Index layer: bounding-box R*-tree filter + exact refinement
//! - Query layer: `@field:[within:...]` extraction, params, evaluation
//! - Database layer: record store, index catalog, ingestion hooks, search

pub mod config;
pub mod logging;
pub mod types;
pub mod geometry;
pub mod index;
pub mod query;
pub mod document;
pub mod catalog;
pub mod database;

mod error;

pub use config::{GeoConfig, LogConfig, ParserConfig, RingClosure, SearchConfig};
pub use error::{EvalError, GeoError, InvalidQueryGeometry, ParseError, QueryError, Result};

// Main public API
pub use database::{DatabaseStats, GeoDB, IndexInfo, SearchHit, SearchOptions, SearchResult};
pub use document::Record;
pub use index::{PredicateKind, SpatialIndex};
pub use query::evaluate;
pub use types::{BoundingBox, GeometryField, IndexSchema, Point, Polygon, RecordId, SourceKind};
