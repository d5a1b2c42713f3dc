/// Index registry for managing index schemas
use crate::types::IndexSchema;
use crate::{GeoError, Result};
use ahash::AHashMap;
use parking_lot::RwLock;

/// Index registry (in memory; schemas live as long as the database)
pub struct IndexRegistry {
    /// Index name -> IndexSchema
    schemas: RwLock<AHashMap<String, IndexSchema>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(AHashMap::new()),
        }
    }

    /// Register a new index
    pub fn create_index(&self, schema: IndexSchema) -> Result<()> {
        schema.validate().map_err(GeoError::InvalidArgument)?;

        let mut schemas = self.schemas.write();
        if schemas.contains_key(&schema.name) {
            return Err(GeoError::IndexExists(schema.name));
        }
        schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Unregister an index, returning its schema
    pub fn drop_index(&self, name: &str) -> Result<IndexSchema> {
        self.schemas
            .write()
            .remove(name)
            .ok_or_else(|| GeoError::IndexNotFound(name.to_string()))
    }

    /// Index names, ascending
    pub fn list_indexes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self::new()
    }
}
