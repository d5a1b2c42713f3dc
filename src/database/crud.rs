//! Record writes and reads
//!
//! Every write re-resolves the geometry fields of each index covering the
//! key, while the record's map entry is still held:
//! - text present and valid: upsert
//! - text absent: remove
//! - text invalid: previous entry kept, failure counted

use crate::database::core::{GeoDB, IndexHandle};
use crate::document::{JsonPath, Record};
use crate::geometry::parse_with;
use crate::types::SourceKind;
use crate::{GeoError, Result};
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tracing::{debug, warn};

impl GeoDB {
    /// Set hash fields, creating the record if needed
    ///
    /// Returns the number of fields that did not exist before.
    pub fn hset(&self, key: &str, fields: &[(&str, &str)]) -> Result<usize> {
        if fields.is_empty() {
            return Err(GeoError::InvalidArgument("HSET needs at least one field".into()));
        }

        let _ddl = self.ddl_lock.read();
        let mut record = self
            .records
            .entry(key.to_string())
            .or_insert_with(|| Record::Hash(Vec::new()));
        if record.kind() != SourceKind::Hash {
            return Err(GeoError::WrongType(format!("'{}' holds a JSON document", key)));
        }

        let added = fields
            .iter()
            .filter(|(field, value)| record.hash_set(field, value))
            .count();
        self.sync_indexes(key, Some(&*record));
        debug!(key, added, "hset");
        Ok(added)
    }

    /// Remove hash fields; a hash left without fields is deleted
    ///
    /// Returns the number of fields removed.
    pub fn hdel(&self, key: &str, fields: &[&str]) -> Result<usize> {
        let _ddl = self.ddl_lock.read();
        let mut entry = match self.records.entry(key.to_string()) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(_) => return Ok(0),
        };
        if entry.get().kind() != SourceKind::Hash {
            return Err(GeoError::WrongType(format!("'{}' holds a JSON document", key)));
        }

        let removed = fields.iter().filter(|field| entry.get_mut().hash_del(field)).count();
        if entry.get().is_empty_hash() {
            entry.remove();
            self.sync_indexes(key, None);
        } else if removed > 0 {
            self.sync_indexes(key, Some(entry.get()));
        }
        debug!(key, removed, "hdel");
        Ok(removed)
    }

    /// Set a JSON value at `path`; new documents must be set at the root
    pub fn json_set(&self, key: &str, path: &str, json_text: &str) -> Result<()> {
        let path = JsonPath::parse(path)?;
        let value: Value = serde_json::from_str(json_text)?;

        let _ddl = self.ddl_lock.read();
        match self.records.entry(key.to_string()) {
            Entry::Vacant(entry) => {
                if !path.is_root() {
                    return Err(GeoError::InvalidPath(format!(
                        "new document '{}' must be created at the root",
                        key
                    )));
                }
                let record = entry.insert(Record::Json(value));
                self.sync_indexes(key, Some(&*record));
            }
            Entry::Occupied(mut entry) => {
                let Record::Json(document) = entry.get_mut() else {
                    return Err(GeoError::WrongType(format!("'{}' holds a hash", key)));
                };
                path.set(document, value)?;
                self.sync_indexes(key, Some(entry.get()));
            }
        }
        debug!(key, path = %path, "json set");
        Ok(())
    }

    /// Remove the value at `path` of a JSON document; the root path deletes
    /// the whole record
    ///
    /// Returns the number of values removed (0 or 1).
    pub fn json_del(&self, key: &str, path: &str) -> Result<usize> {
        let path = JsonPath::parse(path)?;

        let _ddl = self.ddl_lock.read();
        let mut entry = match self.records.entry(key.to_string()) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(_) => return Ok(0),
        };
        if entry.get().kind() != SourceKind::Json {
            return Err(GeoError::WrongType(format!("'{}' holds a hash", key)));
        }

        if path.is_root() {
            entry.remove();
            self.sync_indexes(key, None);
            debug!(key, "json del document");
            return Ok(1);
        }

        let removed = match entry.get_mut() {
            Record::Json(document) => path.remove(document),
            Record::Hash(_) => false,
        };
        if removed {
            self.sync_indexes(key, Some(entry.get()));
        }
        debug!(key, path = %path, removed, "json del");
        Ok(usize::from(removed))
    }

    /// Delete a record of either shape; returns whether it existed
    pub fn del(&self, key: &str) -> bool {
        let _ddl = self.ddl_lock.read();
        match self.records.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                entry.remove();
                self.sync_indexes(key, None);
                debug!(key, "del");
                true
            }
            Entry::Vacant(_) => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        self.records.get(key).map(|r| r.value().clone())
    }

    pub fn exists(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Geometry text of `record_id` as seen by field `alias` of `index`
    pub fn resolve_geometry_text(&self, index: &str, alias: &str, record_id: &str) -> Result<Option<String>> {
        let handle = self
            .handle(index)
            .ok_or_else(|| GeoError::IndexNotFound(index.to_string()))?;
        let field = handle.field(alias).ok_or_else(|| GeoError::UnknownField {
            index: index.to_string(),
            field: alias.to_string(),
        })?;
        Ok(self
            .records
            .get(record_id)
            .and_then(|record| field.resolver.resolve_geometry_text(record.value())))
    }

    /// Bring every covering index in line with `record` (None = deleted)
    pub(crate) fn sync_indexes(&self, key: &str, record: Option<&Record>) {
        for handle in self.spatial_indexes.iter() {
            if handle.schema.covers_key(key) {
                self.sync_handle(handle.value(), key, record);
            }
        }
    }

    fn sync_handle(&self, handle: &IndexHandle, key: &str, record: Option<&Record>) {
        for field in &handle.fields {
            let text = match record.and_then(|r| field.resolver.resolve_geometry_text(r)) {
                Some(text) => text,
                None => {
                    field.index.remove(key);
                    continue;
                }
            };

            let outcome = parse_with(&text, &self.config.parser)
                .and_then(|polygon| field.index.upsert(key, polygon));
            if let Err(e) = outcome {
                handle.record_failure();
                warn!(
                    index = %handle.schema.name,
                    field = %field.field.alias,
                    key,
                    error = %e,
                    "geometry rejected, keeping previous entry"
                );
            }
        }
    }
}
