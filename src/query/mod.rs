//! Query layer
//!
//! - `predicate`: extract the geometry predicate and bind `$PARAMS`
//! - `evaluator`: parse the polygon and run it against a spatial index

pub mod evaluator;
pub mod predicate;

pub use evaluator::{evaluate, QueryEvaluator};
pub use predicate::{bind_params, BoundGeoQuery, GeoQuery, Operand};

use crate::QueryError;

/// Query dialects that accept geometry predicates
pub const SUPPORTED_DIALECTS: [u8; 3] = [2, 3, 4];

pub fn check_dialect(dialect: u8) -> Result<(), QueryError> {
    if SUPPORTED_DIALECTS.contains(&dialect) {
        Ok(())
    } else {
        Err(QueryError::UnsupportedDialect(dialect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dialect() {
        assert!(check_dialect(3).is_ok());
        assert_eq!(check_dialect(1), Err(QueryError::UnsupportedDialect(1)));
    }
}
