//! Geometry parsing, validation and exact predicates

pub mod wkt;
pub mod predicates;

pub use predicates::{polygon_contains, polygon_within, ring_self_intersects};
pub use wkt::{parse, parse_with};

use crate::types::Point;
use crate::ParseError;
use geo::kernels::{Kernel, Orientation, RobustKernel};

/// Number of distinct vertices, counting at most `limit`
pub(crate) fn count_distinct(vertices: &[Point], limit: usize) -> usize {
    let mut distinct: Vec<Point> = Vec::with_capacity(limit);
    for p in vertices {
        if !distinct.iter().any(|d| d == p) {
            distinct.push(*p);
            if distinct.len() == limit {
                break;
            }
        }
    }
    distinct.len()
}

/// Whether every vertex lies on one line (robust orientation test)
pub(crate) fn all_collinear(vertices: &[Point]) -> bool {
    let Some(a) = vertices.first() else {
        return true;
    };
    let Some(b) = vertices.iter().find(|p| *p != a) else {
        return true;
    };
    vertices.iter().all(|c| {
        <RobustKernel as Kernel<f64>>::orient2d(a.to_coord(), b.to_coord(), c.to_coord())
            == Orientation::Collinear
    })
}

/// Check the polygon invariant on a closed ring
pub(crate) fn validate_ring(ring: &[Point]) -> Result<(), ParseError> {
    let (first, last) = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ParseError::DegenerateRing("empty ring".to_string())),
    };

    if let Some(p) = ring.iter().find(|p| !p.is_finite()) {
        return Err(ParseError::DegenerateRing(format!("non-finite vertex {}", p)));
    }

    if ring.len() < 2 || first != last {
        return Err(ParseError::UnclosedRing {
            first: first.to_string(),
            last: last.to_string(),
        });
    }

    let distinct = count_distinct(&ring[..ring.len() - 1], 3);
    if distinct < 3 {
        return Err(ParseError::DegenerateRing(format!(
            "{} distinct vertices, at least 3 required",
            distinct
        )));
    }

    if all_collinear(ring) {
        return Err(ParseError::DegenerateRing("all vertices are collinear".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_count_distinct() {
        let points = ring(&[(1.0, 1.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0)]);
        assert_eq!(count_distinct(&points, 3), 2);

        let points = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert_eq!(count_distinct(&points, 3), 3);
    }

    #[test]
    fn test_validate_ring() {
        assert!(validate_ring(&ring(&[(0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (0.0, 0.0)])).is_ok());

        let err = validate_ring(&[]).unwrap_err();
        assert!(matches!(err, ParseError::DegenerateRing(_)));

        let err = validate_ring(&ring(&[(0.0, 0.0), (4.0, 0.0), (0.0, 4.0)])).unwrap_err();
        assert!(matches!(err, ParseError::UnclosedRing { .. }));

        // collinear
        let err = validate_ring(&ring(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.0, 0.0)])).unwrap_err();
        assert!(matches!(err, ParseError::DegenerateRing(_)));

        let err = validate_ring(&ring(&[(0.0, 0.0), (f64::NAN, 1.0), (2.0, 0.0), (0.0, 0.0)])).unwrap_err();
        assert!(matches!(err, ParseError::DegenerateRing(_)));
    }

    #[test]
    fn test_symmetric_bowtie_is_not_degenerate() {
        // lobes cancel out to zero signed area, but the vertices span a plane
        let bowtie = ring(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0), (0.0, 0.0)]);
        assert!(validate_ring(&bowtie).is_ok());
    }

    #[test]
    fn test_all_collinear() {
        assert!(all_collinear(&ring(&[(0.0, 0.0), (1.0, 1.0), (3.0, 3.0), (0.0, 0.0)])));
        assert!(all_collinear(&ring(&[(1.0, 1.0), (1.0, 1.0)])));
        assert!(!all_collinear(&ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1e-12)])));
        // tiny coordinates keep their orientation
        assert!(!all_collinear(&ring(&[(0.0, 0.0), (3e-10, 0.0), (0.0, 3e-10)])));
    }
}
