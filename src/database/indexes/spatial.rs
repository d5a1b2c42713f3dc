//! Geometry index operations
//!
//! Create (with backfill of existing records), drop and describe the
//! spatial indexes declared on a database.

use crate::database::core::{FieldIndex, GeoDB, IndexHandle};
use crate::document::{resolver_for, Record};
use crate::geometry::parse_with;
use crate::index::SpatialIndex;
use crate::types::{GeometryField, IndexSchema, SourceKind};
use crate::{GeoError, ParseError, Result};
use ahash::AHashSet;
use rayon::iter::Either;
use rayon::prelude::*;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Index description returned by `index_info`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub name: String,
    pub source: SourceKind,
    pub prefixes: Vec<String>,
    pub fields: Vec<GeometryField>,
    /// Records with at least one indexed geometry
    pub num_docs: usize,
    /// Geometry values rejected since the index was created
    pub failures: usize,
    /// Approximate in-memory size of all field indexes
    pub memory_bytes: usize,
}

impl GeoDB {
    /// Declare a geometry index and backfill it from existing records
    ///
    /// # Example
    /// ```ignore
    /// let schema = IndexSchema::new("idx", SourceKind::Json)
    ///     .with_field(GeometryField::path("$.geom", "geom"));
    /// db.create_index(schema)?;
    /// ```
    pub fn create_index(&self, schema: IndexSchema) -> Result<()> {
        schema.validate().map_err(GeoError::InvalidArgument)?;
        let fields = schema
            .fields
            .iter()
            .map(|field| -> Result<FieldIndex> {
                Ok(FieldIndex {
                    field: field.clone(),
                    resolver: resolver_for(schema.source, field)?,
                    index: SpatialIndex::new(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let _ddl = self.ddl_lock.write();
        self.index_registry.create_index(schema.clone())?;

        let handle = IndexHandle {
            schema,
            fields,
            failures: AtomicUsize::new(0),
        };
        self.backfill(&handle);

        info!(
            index = %handle.schema.name,
            source = %handle.schema.source,
            fields = handle.fields.len(),
            "index created"
        );
        self.spatial_indexes
            .insert(handle.schema.name.clone(), Arc::new(handle));
        Ok(())
    }

    /// Index existing records: parse in parallel, then one batch per field
    fn backfill(&self, handle: &IndexHandle) {
        let start_time = Instant::now();
        let snapshot: Vec<(String, Record)> = self
            .records
            .iter()
            .filter(|entry| handle.schema.covers_key(entry.key()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        if snapshot.is_empty() {
            return;
        }

        let parser = &self.config.parser;
        for field in &handle.fields {
            let (parsed, rejected): (Vec<_>, Vec<(String, ParseError)>) = snapshot
                .par_iter()
                .filter_map(|(key, record)| {
                    let text = field.resolver.resolve_geometry_text(record)?;
                    Some(match parse_with(&text, parser) {
                        Ok(polygon) => Either::Left((key.clone(), polygon)),
                        Err(e) => Either::Right((key.clone(), e)),
                    })
                })
                .partition_map(|outcome| outcome);

            for (key, error) in &rejected {
                handle.record_failure();
                warn!(
                    index = %handle.schema.name,
                    field = %field.field.alias,
                    key = %key,
                    error = %error,
                    "geometry rejected during backfill"
                );
            }
            let indexed = field.index.upsert_batch(parsed);
            info!(
                index = %handle.schema.name,
                field = %field.field.alias,
                scanned = snapshot.len(),
                indexed,
                rejected = rejected.len(),
                elapsed = ?start_time.elapsed(),
                "backfill complete"
            );
        }
    }

    /// Drop an index; records are left untouched
    pub fn drop_index(&self, name: &str) -> Result<()> {
        let _ddl = self.ddl_lock.write();
        self.index_registry.drop_index(name)?;
        if let Some((_, handle)) = self.spatial_indexes.remove(name) {
            for field in &handle.fields {
                field.index.clear();
            }
        }
        info!(index = name, "index dropped");
        Ok(())
    }

    pub fn index_info(&self, name: &str) -> Result<IndexInfo> {
        let handle = self
            .handle(name)
            .ok_or_else(|| GeoError::IndexNotFound(name.to_string()))?;

        let mut docs: AHashSet<String> = AHashSet::new();
        let mut memory_bytes = 0;
        for field in &handle.fields {
            docs.extend(field.index.record_ids());
            memory_bytes += field.index.memory_usage();
        }

        Ok(IndexInfo {
            name: handle.schema.name.clone(),
            source: handle.schema.source,
            prefixes: handle.schema.prefixes.clone(),
            fields: handle.schema.fields.clone(),
            num_docs: docs.len(),
            failures: handle.failure_count(),
            memory_bytes,
        })
    }

    /// Declared index names, ascending
    pub fn list_indexes(&self) -> Vec<String> {
        self.index_registry.list_indexes()
    }
}
