//! WKT polygon parser - reads `POLYGON((x y, ...))` text with the `wkt`
//! reader and checks the ring against the polygon invariant

use super::{count_distinct, predicates, validate_ring};
use crate::config::{ParserConfig, RingClosure};
use crate::types::{Point, Polygon};
use crate::ParseError;
use ::wkt::Wkt;
use std::str::FromStr;

/// Parse with the default parser configuration (auto-close)
pub fn parse(text: &str) -> Result<Polygon, ParseError> {
    parse_with(text, &ParserConfig::default())
}

/// Parse and validate a single-ring WKT polygon
pub fn parse_with(text: &str, config: &ParserConfig) -> Result<Polygon, ParseError> {
    let mut vertices = read_ring(text)?;
    check_vertex_limit(&vertices, config)?;

    let distinct = count_distinct(&vertices, 3);
    if distinct < 3 {
        return Err(ParseError::DegenerateRing(format!(
            "{} distinct vertices, at least 3 required",
            distinct
        )));
    }

    let first = vertices[0];
    let last = vertices[vertices.len() - 1];
    if first != last {
        match config.ring_closure {
            RingClosure::AutoClose => vertices.push(first),
            RingClosure::Reject => {
                return Err(ParseError::UnclosedRing {
                    first: first.to_string(),
                    last: last.to_string(),
                })
            }
        }
    }
    check_vertex_limit(&vertices, config)?;

    validate_ring(&vertices)?;

    if config.reject_self_intersections && predicates::ring_self_intersects(&vertices) {
        return Err(ParseError::DegenerateRing("ring boundary intersects itself".to_string()));
    }

    Ok(Polygon::from_ring_unchecked(vertices))
}

/// Vertices of the only ring of a 2D `POLYGON`, as written
fn read_ring(text: &str) -> Result<Vec<Point>, ParseError> {
    // the reader stops at the end of the geometry without looking further
    if !text.trim_end().ends_with(')') {
        return Err(ParseError::malformed("expected POLYGON((x y, ...))"));
    }
    let geometry = Wkt::<f64>::from_str(text).map_err(|e| ParseError::malformed(e.to_string()))?;

    let polygon = match geometry {
        Wkt::Polygon(polygon) => polygon,
        _ => return Err(ParseError::malformed("expected POLYGON")),
    };
    let mut rings = polygon.0.into_iter();
    let ring = match (rings.next(), rings.next()) {
        (Some(ring), None) => ring,
        (None, _) => return Err(ParseError::malformed("polygon has no ring")),
        (Some(_), Some(_)) => {
            return Err(ParseError::malformed("polygons with interior rings are not supported"))
        }
    };

    ring.0
        .into_iter()
        .map(|coord| {
            if coord.z.is_some() || coord.m.is_some() {
                return Err(ParseError::malformed("expected exactly 2 coordinates per vertex"));
            }
            let point = Point::new(coord.x, coord.y);
            if !point.is_finite() {
                return Err(ParseError::malformed(format!("non-finite coordinate '{}'", point)));
            }
            Ok(point)
        })
        .collect()
}

fn check_vertex_limit(vertices: &[Point], config: &ParserConfig) -> Result<(), ParseError> {
    match config.max_vertices {
        Some(limit) if vertices.len() > limit => Err(ParseError::malformed(format!(
            "too many vertices: {} exceeds the limit of {}",
            vertices.len(),
            limit
        ))),
        _ => Ok(()),
    }
}
