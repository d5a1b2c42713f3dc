//! Spatial geometry data types

use crate::geometry;
use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 2D point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn to_coord(self) -> geo::Coord<f64> {
        geo::Coord { x: self.x, y: self.y }
    }

    /// Bit-level equality (distinguishes -0.0 from 0.0)
    pub fn bits_eq(&self, other: &Point) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn from_point(point: Point) -> Self {
        Self {
            min_x: point.x,
            min_y: point.y,
            max_x: point.x,
            max_y: point.y,
        }
    }

    /// Smallest box enclosing all points (None for an empty slice)
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = BoundingBox::from_point(*first);
        for point in rest {
            bbox.expand(point);
        }
        Some(bbox)
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Closed containment: equal boxes contain each other
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    pub fn expand(&mut self, point: &Point) {
        self.min_x = self.min_x.min(point.x);
        self.min_y = self.min_y.min(point.y);
        self.max_x = self.max_x.max(point.x);
        self.max_y = self.max_y.max(point.y);
    }
}

/// Simple polygon stored as a closed ring (first vertex == last vertex).
///
/// Built by the WKT parser, or by [`Polygon::from_ring_unchecked`] for
/// callers that validate separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    ring: Vec<Point>,
    bbox: BoundingBox,
}

impl Polygon {
    /// Close the ring if needed and check the polygon invariant
    pub fn try_new(mut vertices: Vec<Point>) -> Result<Self, ParseError> {
        let needs_closing = match (vertices.first(), vertices.last()) {
            (Some(first), Some(last)) => !first.bits_eq(last),
            _ => false,
        };
        if needs_closing {
            let first = vertices[0];
            vertices.push(first);
        }
        let polygon = Self::from_ring_unchecked(vertices);
        polygon.validate()?;
        Ok(polygon)
    }

    /// Wrap a ring without validation. Queries against the spatial index
    /// re-validate, so an invalid polygon built here is rejected there.
    pub fn from_ring_unchecked(ring: Vec<Point>) -> Self {
        let bbox = BoundingBox::from_points(&ring)
            .unwrap_or_else(|| BoundingBox::new(0.0, 0.0, 0.0, 0.0));
        Self { ring, bbox }
    }

    /// Closed ring, last vertex repeats the first
    pub fn ring(&self) -> &[Point] {
        &self.ring
    }

    /// Ring without the closing vertex
    pub fn vertices(&self) -> &[Point] {
        match self.ring.len() {
            0 => &self.ring,
            n => &self.ring[..n - 1],
        }
    }

    /// Boundary edges in ring order
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.ring.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// The ring as a `geo` polygon without holes
    pub fn to_geo(&self) -> geo::Polygon<f64> {
        let exterior: Vec<geo::Coord<f64>> = self.ring.iter().map(|p| p.to_coord()).collect();
        geo::Polygon::new(geo::LineString::new(exterior), Vec::new())
    }

    /// Check the minimal polygon invariant: finite coordinates, closed ring,
    /// at least three distinct vertices, not all on one line.
    pub fn validate(&self) -> Result<(), ParseError> {
        geometry::validate_ring(&self.ring)
    }

    /// Approximate heap + inline size
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.ring.capacity() * std::mem::size_of::<Point>()
    }
}

impl PartialEq for Polygon {
    /// Vertex-for-vertex, bit-identical
    fn eq(&self, other: &Self) -> bool {
        self.ring.len() == other.ring.len()
            && self.ring.iter().zip(&other.ring).all(|(a, b)| a.bits_eq(b))
    }
}

impl fmt::Display for Polygon {
    /// Canonical WKT; parsing the output yields an identical polygon
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("POLYGON((")?;
        for (i, point) in self.ring.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", point)?;
        }
        f.write_str("))")
    }
}
