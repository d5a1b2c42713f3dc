//! Geometry search
//!
//! `@field:[within:POLYGON(...)]` style queries against a declared index.
//! Matches are ordered by record id, then paginated.

use crate::database::core::{GeoDB, IndexHandle};
use crate::document::Record;
use crate::query::{check_dialect, GeoQuery, QueryEvaluator};
use crate::types::RecordId;
use crate::{GeoError, QueryError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Per-query options (`PARAMS`, `DIALECT`, `LIMIT offset num`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub params: HashMap<String, String>,
    /// None = configured default
    pub dialect: Option<u8>,
    /// None = configured default
    pub limit: Option<usize>,
    pub offset: usize,
}

impl SearchOptions {
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_dialect(mut self, dialect: u8) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn with_limit(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }
}

/// One matching record
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: RecordId,
    /// Hash: every field in insertion order. JSON: (alias, geometry text).
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResult {
    /// Matches before pagination
    pub total: usize,
    pub hits: Vec<SearchHit>,
}

impl SearchResult {
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.id.as_str()).collect()
    }
}

impl GeoDB {
    pub fn search(&self, index: &str, query: &str, options: &SearchOptions) -> Result<SearchResult> {
        let handle = self
            .handle(index)
            .ok_or_else(|| GeoError::IndexNotFound(index.to_string()))?;

        check_dialect(options.dialect.unwrap_or(self.config.search.default_dialect))?;
        let bound = GeoQuery::parse(query)?.bind(&options.params)?;
        let field = handle.field(&bound.field).ok_or_else(|| GeoError::UnknownField {
            index: index.to_string(),
            field: bound.field.clone(),
        })?;

        let ids = QueryEvaluator::new(self.config.parser.clone())
            .evaluate(bound.kind, &bound.polygon_text, &field.index)
            .map_err(QueryError::Eval)?;

        let total = ids.len();
        let limit = options.limit.unwrap_or(self.config.search.default_limit);
        let hits: Vec<SearchHit> = ids
            .into_iter()
            .skip(options.offset)
            .take(limit)
            .filter_map(|id| self.load_hit(&handle, id))
            .collect();

        debug!(index, kind = %bound.kind, field = %bound.field, total, returned = hits.len(), "search");
        Ok(SearchResult { total, hits })
    }

    fn load_hit(&self, handle: &IndexHandle, id: RecordId) -> Option<SearchHit> {
        let record = self.records.get(&id)?;
        let fields = match record.value() {
            Record::Hash(fields) => fields.clone(),
            json @ Record::Json(_) => handle
                .fields
                .iter()
                .filter_map(|f| {
                    f.resolver
                        .resolve_geometry_text(json)
                        .map(|text| (f.field.alias.clone(), text))
                })
                .collect(),
        };
        Some(SearchHit { id, fields })
    }
}
