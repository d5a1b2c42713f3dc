//! Index layer implementation
//!
//! Geometry-typed secondary index backed by an R*-tree

pub mod spatial_rtree;

pub use spatial_rtree::{IndexedGeometry, SpatialIndex, SpatialIndexStats};

use std::fmt;
use std::str::FromStr;

/// Spatial predicate evaluated against indexed geometries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    /// Stored geometry lies within the query polygon
    Within,

    /// Stored geometry contains the query polygon
    Contains,
}

impl FromStr for PredicateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("within") {
            Ok(PredicateKind::Within)
        } else if s.eq_ignore_ascii_case("contains") {
            Ok(PredicateKind::Contains)
        } else {
            Err(format!("unknown spatial predicate '{}'", s))
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateKind::Within => f.write_str("within"),
            PredicateKind::Contains => f.write_str("contains"),
        }
    }
}
