//! Error types for the geosearch engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeoError>;

/// Geometry text rejected by the WKT parser
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Malformed polygon syntax: {reason}")]
    MalformedSyntax { reason: String },

    #[error("Degenerate ring: {0}")]
    DegenerateRing(String),

    #[error("Unclosed ring: first vertex {first} differs from last vertex {last}")]
    UnclosedRing { first: String, last: String },
}

impl ParseError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ParseError::MalformedSyntax {
            reason: reason.into(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ParseError::MalformedSyntax { .. })
    }
}

/// Query polygon reached the index without satisfying the polygon invariant
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid query geometry: {0}")]
pub struct InvalidQueryGeometry(pub ParseError);

/// Failure evaluating a geometry query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Bad query syntax: {0}")]
    BadQuerySyntax(#[from] ParseError),

    #[error("Bad query geometry: {0}")]
    BadQueryGeometry(#[from] InvalidQueryGeometry),
}

/// Failure in the query front end (predicate extraction and parameter binding)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Syntax error in query: {0}")]
    Syntax(String),

    #[error("No such parameter: ${0}")]
    MissingParam(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(u8),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Index already exists: {0}")]
    IndexExists(String),

    #[error("Unknown field '{field}' in index '{index}'")]
    UnknownField { index: String, field: String },

    #[error("Wrong type: {0}")]
    WrongType(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<EvalError> for GeoError {
    fn from(err: EvalError) -> Self {
        GeoError::Query(QueryError::Eval(err))
    }
}
