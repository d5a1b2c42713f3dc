//! Engine configuration
//!
//! Parser validation policy, search defaults and logging, with presets for
//! common deployments.

use crate::{GeoError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the parser does with a ring whose first and last vertex differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RingClosure {
    /// Append the first vertex to close the ring
    #[default]
    AutoClose,

    /// Fail with `ParseError::UnclosedRing`
    Reject,
}

/// Geometry parser configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Ring closure policy
    pub ring_closure: RingClosure,

    /// Maximum vertices per ring (None = unlimited)
    pub max_vertices: Option<usize>,

    /// Reject rings whose edges cross each other
    ///
    /// O(n²) in the number of vertices.
    pub reject_self_intersections: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            ring_closure: RingClosure::AutoClose,
            max_vertices: None,
            reject_self_intersections: false,
        }
    }
}

impl ParserConfig {
    pub fn with_ring_closure(mut self, closure: RingClosure) -> Self {
        self.ring_closure = closure;
        self
    }

    pub fn with_max_vertices(mut self, limit: usize) -> Self {
        self.max_vertices = Some(limit);
        self
    }

    pub fn with_self_intersection_check(mut self, enabled: bool) -> Self {
        self.reject_self_intersections = enabled;
        self
    }
}

/// Search front end configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Dialect used when a query does not name one
    pub default_dialect: u8,

    /// Page size used when a query does not set LIMIT
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_dialect: 3,
            default_limit: 10,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, e.g. "info" or "geosearch=debug"
    pub level: String,

    /// Print the event target (module path)
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: false,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeoConfig {
    pub parser: ParserConfig,
    pub search: SearchConfig,
    pub log: LogConfig,
}

impl GeoConfig {
    /// Reject unclosed and self-intersecting rings
    pub fn strict() -> Self {
        Self {
            parser: ParserConfig::default()
                .with_ring_closure(RingClosure::Reject)
                .with_self_intersection_check(true),
            ..Default::default()
        }
    }

    /// Verbose logging, default parser
    pub fn for_testing() -> Self {
        Self {
            log: LogConfig {
                level: "debug".to_string(),
                with_target: true,
            },
            ..Default::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: GeoConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.parser.max_vertices {
            // A closed triangle needs four stored vertices
            if limit < 4 {
                return Err(GeoError::Config(format!(
                    "parser.max_vertices must be at least 4, got {}",
                    limit
                )));
            }
        }
        if !crate::query::SUPPORTED_DIALECTS.contains(&self.search.default_dialect) {
            return Err(GeoError::Config(format!(
                "search.default_dialect {} is not supported",
                self.search.default_dialect
            )));
        }
        if self.search.default_limit == 0 {
            return Err(GeoError::Config("search.default_limit must be positive".into()));
        }
        Ok(())
    }
}
