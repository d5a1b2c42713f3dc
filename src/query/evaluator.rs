//! Query evaluator: polygon literal -> matching record ids
//!
//! Stateless and reentrant; holds only the parser policy.

use crate::config::ParserConfig;
use crate::geometry::parse_with;
use crate::index::{PredicateKind, SpatialIndex};
use crate::types::RecordId;
use crate::EvalError;

/// Evaluate a "within" query with the default parser policy
pub fn evaluate(query_text: &str, index: &SpatialIndex) -> Result<Vec<RecordId>, EvalError> {
    QueryEvaluator::default().evaluate(PredicateKind::Within, query_text, index)
}

#[derive(Debug, Clone, Default)]
pub struct QueryEvaluator {
    config: ParserConfig,
}

impl QueryEvaluator {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse `query_text` and run `kind` against a snapshot of `index`
    pub fn evaluate(
        &self,
        kind: PredicateKind,
        query_text: &str,
        index: &SpatialIndex,
    ) -> Result<Vec<RecordId>, EvalError> {
        let polygon = parse_with(query_text, &self.config)?;
        Ok(index.query(kind, &polygon)?)
    }
}
