//! Exact polygon predicates
//!
//! Containment follows the DE-9IM `contains` relation, so it is
//! boundary-inclusive: a polygon touching the query boundary from inside,
//! or equal to the query, is within it. Orientation tests go through the
//! robust kernel and do not depend on coordinate scale.

use crate::types::{Point, Polygon};
use geo::{Contains, Intersects, Line};

/// Whether `inner` lies entirely inside or on the boundary of `outer`
pub fn polygon_within(inner: &Polygon, outer: &Polygon) -> bool {
    outer.bounding_box().contains_box(&inner.bounding_box()) && outer.to_geo().contains(&inner.to_geo())
}

/// Whether `outer` contains `inner` (boundary-inclusive)
pub fn polygon_contains(outer: &Polygon, inner: &Polygon) -> bool {
    polygon_within(inner, outer)
}

/// Whether any two non-adjacent edges of a closed ring touch or cross
pub fn ring_self_intersects(ring: &[Point]) -> bool {
    let mut points: Vec<Point> = Vec::with_capacity(ring.len());
    for p in ring {
        if points.last() != Some(p) {
            points.push(*p);
        }
    }
    if points.len() < 4 {
        return false;
    }

    let edges: Vec<Line<f64>> = points
        .windows(2)
        .map(|w| Line::new(w[0].to_coord(), w[1].to_coord()))
        .collect();
    let n = edges.len();
    for i in 0..n {
        for j in (i + 2)..n {
            // first and last edge share the closing vertex
            if i == 0 && j == n - 1 {
                continue;
            }
            if edges[i].intersects(&edges[j]) {
                return true;
            }
        }
    }
    false
}
