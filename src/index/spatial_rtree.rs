//! Spatial index: record id -> polygon, with an R*-tree bounding-box filter
//!
//! # Query path
//! 1. R*-tree lookup on bounding boxes (cheap rejection)
//! 2. Exact boundary-inclusive polygon containment on the survivors (`geo`)
//!
//! The entry map and the R*-tree live behind one `RwLock`: writers swap both
//! under the write lock, so a query sees either the old or the new geometry
//! of a record, never a mix.

use crate::index::PredicateKind;
use crate::types::{BoundingBox, Polygon, RecordId};
use crate::{InvalidQueryGeometry, ParseError};
use ahash::AHashMap;
use geo::Contains;
use parking_lot::RwLock;
use rstar::{Envelope, RTree, RTreeObject, AABB};
use tracing::debug;

/// A stored (record id, polygon) pair
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedGeometry {
    pub record_id: RecordId,
    pub polygon: Polygon,
    /// `polygon` converted once for the exact predicates
    shape: geo::Polygon<f64>,
}

impl IndexedGeometry {
    fn new(record_id: RecordId, polygon: Polygon) -> Self {
        let shape = polygon.to_geo();
        Self {
            record_id,
            polygon,
            shape,
        }
    }
}

/// R*-tree entry: bounding box keyed by record id
#[derive(Debug, Clone)]
struct RTreeEntry {
    record_id: RecordId,
    bbox: AABB<[f64; 2]>,
}

impl RTreeObject for RTreeEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bbox
    }
}

impl PartialEq for RTreeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.record_id == other.record_id
    }
}

fn to_aabb(bbox: &BoundingBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y])
}

struct IndexInner {
    entries: AHashMap<RecordId, IndexedGeometry>,
    rtree: RTree<RTreeEntry>,
}

impl IndexInner {
    fn new() -> Self {
        Self {
            entries: AHashMap::new(),
            rtree: RTree::new(),
        }
    }

    /// Remove the entry and its R*-tree box; returns the old geometry
    fn take(&mut self, record_id: &str) -> Option<IndexedGeometry> {
        let old = self.entries.remove(record_id)?;
        let entry = RTreeEntry {
            record_id: old.record_id.clone(),
            bbox: to_aabb(&old.polygon.bounding_box()),
        };
        self.rtree.remove(&entry);
        Some(old)
    }

    fn put(&mut self, record_id: &str, polygon: Polygon) -> bool {
        let replaced = self.take(record_id).is_some();
        self.rtree.insert(RTreeEntry {
            record_id: record_id.to_string(),
            bbox: to_aabb(&polygon.bounding_box()),
        });
        self.entries.insert(
            record_id.to_string(),
            IndexedGeometry::new(record_id.to_string(), polygon),
        );
        replaced
    }
}

/// Spatial index statistics
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialIndexStats {
    pub total_entries: usize,
    pub memory_usage: usize,
    pub bytes_per_entry: usize,
}

/// Geometry index for one declared field
pub struct SpatialIndex {
    inner: RwLock<IndexInner>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(IndexInner::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace the geometry of `record_id`
    ///
    /// Returns `true` when an existing geometry was replaced. An invalid
    /// polygon is rejected before the lock is taken.
    pub fn upsert(&self, record_id: &str, polygon: Polygon) -> Result<bool, ParseError> {
        polygon.validate()?;
        let replaced = self.inner.write().put(record_id, polygon);
        debug!(record_id, replaced, "spatial index upsert");
        Ok(replaced)
    }

    /// Insert or replace many geometries under a single write lock
    ///
    /// Invalid polygons are skipped; returns how many were stored.
    pub fn upsert_batch(&self, items: Vec<(RecordId, Polygon)>) -> usize {
        let valid: Vec<(RecordId, Polygon)> = items
            .into_iter()
            .filter(|(_, polygon)| polygon.validate().is_ok())
            .collect();
        let count = valid.len();

        let mut inner = self.inner.write();
        if inner.entries.is_empty() {
            // Fresh index: STR bulk load, last duplicate wins
            let mut entries = AHashMap::with_capacity(count);
            for (record_id, polygon) in valid {
                entries.insert(record_id.clone(), IndexedGeometry::new(record_id, polygon));
            }
            let boxes = entries
                .values()
                .map(|g| RTreeEntry {
                    record_id: g.record_id.clone(),
                    bbox: to_aabb(&g.polygon.bounding_box()),
                })
                .collect();
            inner.rtree = RTree::bulk_load(boxes);
            inner.entries = entries;
        } else {
            for (record_id, polygon) in valid {
                inner.put(&record_id, polygon);
            }
        }

        debug!(count, total = inner.entries.len(), "spatial index batch upsert");
        count
    }

    /// Remove the geometry of `record_id`; returns whether it was present
    pub fn remove(&self, record_id: &str) -> bool {
        let removed = self.inner.write().take(record_id).is_some();
        debug!(record_id, removed, "spatial index remove");
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.rtree = RTree::new();
    }

    pub fn get(&self, record_id: &str) -> Option<Polygon> {
        self.inner.read().entries.get(record_id).map(|g| g.polygon.clone())
    }

    pub fn contains_record(&self, record_id: &str) -> bool {
        self.inner.read().entries.contains_key(record_id)
    }

    /// All indexed record ids, ascending
    pub fn record_ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.inner.read().entries.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Record ids whose geometry lies within `query` (boundary-inclusive), ascending
    pub fn query_within(&self, query: &Polygon) -> Result<Vec<RecordId>, InvalidQueryGeometry> {
        query.validate().map_err(InvalidQueryGeometry)?;
        let envelope = to_aabb(&query.bounding_box());
        let query_shape = query.to_geo();

        let inner = self.inner.read();
        let mut candidates = 0usize;
        let mut results: Vec<RecordId> = inner
            .rtree
            .locate_in_envelope(&envelope)
            .inspect(|_| candidates += 1)
            .filter_map(|entry| inner.entries.get(&entry.record_id))
            .filter(|stored| query_shape.contains(&stored.shape))
            .map(|stored| stored.record_id.clone())
            .collect();
        drop(inner);

        results.sort_unstable();
        debug!(candidates, matches = results.len(), "within query");
        Ok(results)
    }

    /// Record ids whose geometry contains `query` (boundary-inclusive), ascending
    pub fn query_contains(&self, query: &Polygon) -> Result<Vec<RecordId>, InvalidQueryGeometry> {
        query.validate().map_err(InvalidQueryGeometry)?;
        let envelope = to_aabb(&query.bounding_box());
        let query_shape = query.to_geo();

        let inner = self.inner.read();
        let mut candidates = 0usize;
        let mut results: Vec<RecordId> = inner
            .rtree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|entry| entry.bbox.contains_envelope(&envelope))
            .inspect(|_| candidates += 1)
            .filter_map(|entry| inner.entries.get(&entry.record_id))
            .filter(|stored| stored.shape.contains(&query_shape))
            .map(|stored| stored.record_id.clone())
            .collect();
        drop(inner);

        results.sort_unstable();
        debug!(candidates, matches = results.len(), "contains query");
        Ok(results)
    }

    pub fn query(&self, kind: PredicateKind, query: &Polygon) -> Result<Vec<RecordId>, InvalidQueryGeometry> {
        match kind {
            PredicateKind::Within => self.query_within(query),
            PredicateKind::Contains => self.query_contains(query),
        }
    }

    pub fn memory_usage(&self) -> usize {
        self.stats().memory_usage
    }

    /// Approximate memory footprint
    pub fn stats(&self) -> SpatialIndexStats {
        let inner = self.inner.read();
        let per_entry_overhead = std::mem::size_of::<RTreeEntry>()
            + std::mem::size_of::<(RecordId, IndexedGeometry)>();
        let memory_usage: usize = inner
            .entries
            .values()
            .map(|g| {
                per_entry_overhead
                    + 2 * g.record_id.capacity()
                    + g.polygon.memory_usage()
                    + g.shape.exterior().0.capacity() * std::mem::size_of::<geo::Coord<f64>>()
            })
            .sum();
        let total_entries = inner.entries.len();

        SpatialIndexStats {
            total_entries,
            memory_usage,
            bytes_per_entry: if total_entries > 0 {
                memory_usage / total_entries
            } else {
                0
            },
        }
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::parse;
    use crate::types::Point;

    const SMALL: &str = "POLYGON((1 1, 0 10, 10 10, 10 0, 1 1))";
    const LARGE: &str = "POLYGON((1 1, 0 20, 20 20, 20 0, 1 1))";
    const QUERY: &str = "POLYGON((0 0, 0 15, 15 15, 15 0, 0 0))";

    fn poly(text: &str) -> Polygon {
        parse(text).unwrap()
    }

    fn square(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::try_new(vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ])
        .unwrap()
    }

    #[test]
    fn test_within_scenario() {
        let index = SpatialIndex::new();
        index.upsert("small", poly(SMALL)).unwrap();
        index.upsert("large", poly(LARGE)).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.query_within(&poly(QUERY)).unwrap(), vec!["small".to_string()]);
    }

    #[test]
    fn test_boundary_inclusive() {
        let index = SpatialIndex::new();
        index.upsert("small", poly(SMALL)).unwrap();
        assert_eq!(index.query_within(&poly(SMALL)).unwrap(), vec!["small".to_string()]);
        assert_eq!(index.query_contains(&poly(SMALL)).unwrap(), vec!["small".to_string()]);
    }

    #[test]
    fn test_upsert_replaces() {
        let index = SpatialIndex::new();
        assert!(!index.upsert("a", poly(LARGE)).unwrap());
        assert!(index.query_within(&poly(QUERY)).unwrap().is_empty());

        assert!(index.upsert("a", poly(SMALL)).unwrap());
        assert_eq!(index.len(), 1);
        assert_eq!(index.query_within(&poly(QUERY)).unwrap(), vec!["a".to_string()]);
        assert_eq!(index.get("a"), Some(poly(SMALL)));
    }

    #[test]
    fn test_upsert_idempotent() {
        let index = SpatialIndex::new();
        index.upsert("a", poly(SMALL)).unwrap();
        let before = index.query_within(&poly(QUERY)).unwrap();
        for _ in 0..3 {
            index.upsert("a", poly(SMALL)).unwrap();
        }
        assert_eq!(index.query_within(&poly(QUERY)).unwrap(), before);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove() {
        let index = SpatialIndex::new();
        index.upsert("small", poly(SMALL)).unwrap();
        assert!(index.remove("small"));
        assert!(!index.remove("small"));
        assert!(index.query_within(&poly(QUERY)).unwrap().is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let index = SpatialIndex::new();
        index.upsert("small", poly(SMALL)).unwrap();

        let degenerate = Polygon::from_ring_unchecked(vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)]);
        assert!(index.query_within(&degenerate).is_err());
        assert!(index.query_contains(&degenerate).is_err());
        assert!(index.upsert("small", degenerate).is_err());

        // prior state untouched
        assert_eq!(index.get("small"), Some(poly(SMALL)));
    }

    #[test]
    fn test_contains_query() {
        let index = SpatialIndex::new();
        index.upsert("big", square(0.0, 0.0, 100.0)).unwrap();
        index.upsert("tiny", square(50.0, 50.0, 1.0)).unwrap();
        index.upsert("far", square(500.0, 500.0, 100.0)).unwrap();

        let target = square(10.0, 10.0, 5.0);
        assert_eq!(index.query_contains(&target).unwrap(), vec!["big".to_string()]);
        assert_eq!(index.query_within(&target).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_results_sorted() {
        let index = SpatialIndex::new();
        for name in ["d", "b", "a", "c"] {
            index.upsert(name, square(1.0, 1.0, 2.0)).unwrap();
        }
        let results = index.query_within(&square(0.0, 0.0, 10.0)).unwrap();
        assert_eq!(results, vec!["a", "b", "c", "d"]);
        assert_eq!(index.record_ids(), results);
    }

    #[test]
    fn test_batch_upsert() {
        let index = SpatialIndex::new();
        let items: Vec<(RecordId, Polygon)> = (0..100)
            .map(|i| (format!("r{:03}", i), square((i % 10) as f64 * 10.0, (i / 10) as f64 * 10.0, 5.0)))
            .collect();
        assert_eq!(index.upsert_batch(items), 100);
        assert_eq!(index.len(), 100);

        let results = index.query_within(&square(0.0, 0.0, 20.0)).unwrap();
        assert_eq!(results, vec!["r000", "r001", "r010", "r011"]);

        // second batch goes through the incremental path and replaces
        let replaced = vec![("r000".to_string(), square(900.0, 900.0, 5.0))];
        assert_eq!(index.upsert_batch(replaced), 1);
        assert_eq!(index.len(), 100);
        let results = index.query_within(&square(0.0, 0.0, 20.0)).unwrap();
        assert_eq!(results, vec!["r001", "r010", "r011"]);
    }

    #[test]
    fn test_tiny_coordinates() {
        // U shape with a bridge over its notch, shrunk far below unit scale
        let shrink = |text: &str| {
            let polygon = poly(text);
            Polygon::try_new(polygon.vertices().iter().map(|p| Point::new(p.x * 1e-10, p.y * 1e-10)).collect())
                .unwrap()
        };
        let u_shape = shrink("POLYGON((0 0, 10 0, 10 10, 6 10, 6 4, 4 4, 4 10, 0 10, 0 0))");

        let index = SpatialIndex::new();
        index.upsert("bridge", shrink("POLYGON((1 8, 9 8, 9 9, 1 9, 1 8))")).unwrap();
        index.upsert("base", shrink("POLYGON((1 1, 9 1, 9 4, 1 4, 1 1))")).unwrap();
        assert_eq!(index.query_within(&u_shape).unwrap(), vec!["base".to_string()]);

        let triangle = poly("POLYGON((0 0, 3e-10 0, 0 3e-10, 0 0))");
        index.upsert("corner", square(2e-10, 2e-10, 1e-10)).unwrap();
        assert!(index.query_within(&triangle).unwrap().is_empty());
    }

    #[test]
    fn test_stats_and_clear() {
        let index = SpatialIndex::new();
        assert_eq!(index.stats().bytes_per_entry, 0);

        index.upsert("a", poly(SMALL)).unwrap();
        let stats = index.stats();
        assert_eq!(stats.total_entries, 1);
        assert!(stats.memory_usage > 0);
        assert_eq!(index.memory_usage(), stats.memory_usage);

        index.clear();
        assert!(index.is_empty());
        assert!(index.query_within(&poly(QUERY)).unwrap().is_empty());
    }
}
