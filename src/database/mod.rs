//! Database Module
//!
//! # Module Structure
//! - `core`: GeoDB struct and construction
//! - `crud`: Record writes (HSET/HDEL/JSON.SET/DEL) and index maintenance
//! - `indexes`: Index create/drop/info with backfill
//! - `search`: Geometry queries with params, dialect and pagination

pub mod core;
pub mod crud;
pub mod indexes;
pub mod search;

// Re-export main types
pub use core::{DatabaseStats, GeoDB};
pub use indexes::IndexInfo;
pub use search::{SearchHit, SearchOptions, SearchResult};
