//! Database Core - GeoDB structure and initialization
//!
//! This module contains:
//! - GeoDB struct definition
//! - new() / with_config()
//! - Per-index runtime state (one SpatialIndex per geometry field)

use crate::catalog::IndexRegistry;
use crate::config::GeoConfig;
use crate::document::{GeometryResolver, Record};
use crate::index::SpatialIndex;
use crate::types::{GeometryField, IndexSchema};
use crate::Result;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One indexed geometry field
pub(crate) struct FieldIndex {
    pub(crate) field: GeometryField,
    pub(crate) resolver: Box<dyn GeometryResolver>,
    pub(crate) index: SpatialIndex,
}

/// Live state of a declared index
pub(crate) struct IndexHandle {
    pub(crate) schema: IndexSchema,
    pub(crate) fields: Vec<FieldIndex>,
    /// Geometry values rejected at ingestion
    pub(crate) failures: AtomicUsize,
}

impl IndexHandle {
    pub(crate) fn field(&self, alias: &str) -> Option<&FieldIndex> {
        self.fields.iter().find(|f| f.field.alias == alias)
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseStats {
    pub total_records: usize,
    pub num_indexes: usize,
}

/// GeoDB instance
pub struct GeoDB {
    pub(crate) config: GeoConfig,

    /// Record store: key -> record
    pub(crate) records: Arc<DashMap<String, Record>>,

    /// Spatial indexes by index name
    pub(crate) spatial_indexes: Arc<DashMap<String, Arc<IndexHandle>>>,

    /// Index schemas (catalog)
    pub(crate) index_registry: Arc<IndexRegistry>,

    /// Record writes take this shared; index create/drop take it exclusive
    pub(crate) ddl_lock: RwLock<()>,
}

impl GeoDB {
    /// Create an empty database with the default configuration
    pub fn new() -> Self {
        Self::build(GeoConfig::default())
    }

    /// Create an empty database with a validated configuration
    pub fn with_config(config: GeoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: GeoConfig) -> Self {
        Self {
            config,
            records: Arc::new(DashMap::new()),
            spatial_indexes: Arc::new(DashMap::new()),
            index_registry: Arc::new(IndexRegistry::new()),
            ddl_lock: RwLock::new(()),
        }
    }

    pub fn config(&self) -> &GeoConfig {
        &self.config
    }

    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            total_records: self.records.len(),
            num_indexes: self.spatial_indexes.len(),
        }
    }

    pub(crate) fn handle(&self, name: &str) -> Option<Arc<IndexHandle>> {
        self.spatial_indexes.get(name).map(|h| Arc::clone(h.value()))
    }
}

impl Default for GeoDB {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::GeoError;

    #[test]
    fn test_with_config_validates() {
        let config = GeoConfig {
            search: SearchConfig {
                default_dialect: 9,
                default_limit: 10,
            },
            ..Default::default()
        };
        assert!(matches!(GeoDB::with_config(config), Err(GeoError::Config(_))));
        assert!(GeoDB::with_config(GeoConfig::strict()).is_ok());
    }

    #[test]
    fn test_empty_stats() {
        let db = GeoDB::new();
        assert_eq!(
            db.stats(),
            DatabaseStats {
                total_records: 0,
                num_indexes: 0
            }
        );
    }
}
