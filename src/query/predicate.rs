/// Geometry predicate extraction: `@field:[within:POLYGON(...)]`,
/// `@field:[contains:POLYGON(...)]` and the parameterized `@field:[within $NAME]`
use crate::index::PredicateKind;
use crate::QueryError;
use std::collections::HashMap;

/// Polygon operand before parameter binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Inline WKT text
    Literal(String),
    /// `$NAME` placeholder
    Param(String),
}

/// Geometry query as written by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoQuery {
    pub field: String,
    pub kind: PredicateKind,
    pub operand: Operand,
}

/// Geometry query with its polygon text resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundGeoQuery {
    pub field: String,
    pub kind: PredicateKind,
    pub polygon_text: String,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn syntax(msg: impl Into<String>) -> QueryError {
    QueryError::Syntax(msg.into())
}

impl GeoQuery {
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let text = text.trim();
        let rest = text
            .strip_prefix('@')
            .ok_or_else(|| syntax("expected '@field:[...]'"))?;

        let field_end = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
        let (field, rest) = rest.split_at(field_end);
        if field.is_empty() {
            return Err(syntax("missing field name after '@'"));
        }

        let body = rest
            .trim_start()
            .strip_prefix(':')
            .map(str::trim_start)
            .and_then(|r| r.strip_prefix('['))
            .and_then(|r| r.strip_suffix(']'))
            .ok_or_else(|| syntax(format!("expected '[...]' after '@{}:'", field)))?
            .trim();

        let keyword_end = body
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(body.len());
        let (keyword, operand) = body.split_at(keyword_end);
        let kind: PredicateKind = keyword.parse().map_err(syntax)?;

        let operand = if let Some(literal) = operand.strip_prefix(':') {
            Self::parse_operand(literal.trim())?
        } else if operand.starts_with(char::is_whitespace) {
            match Self::parse_operand(operand.trim())? {
                param @ Operand::Param(_) => param,
                Operand::Literal(_) => {
                    return Err(syntax(format!("expected ':' or '$param' after '{}'", keyword)))
                }
            }
        } else {
            return Err(syntax(format!("expected ':' or '$param' after '{}'", keyword)));
        };

        Ok(Self {
            field: field.to_string(),
            kind,
            operand,
        })
    }

    fn parse_operand(text: &str) -> Result<Operand, QueryError> {
        if let Some(name) = text.strip_prefix('$') {
            if name.is_empty() || !name.chars().all(is_name_char) {
                return Err(syntax(format!("invalid parameter name '${}'", name)));
            }
            return Ok(Operand::Param(name.to_string()));
        }
        if text.is_empty() {
            return Err(syntax("missing geometry operand"));
        }
        Ok(Operand::Literal(text.to_string()))
    }

    /// Substitute `$NAME` with its caller-bound value
    pub fn bind(self, params: &HashMap<String, String>) -> Result<BoundGeoQuery, QueryError> {
        let polygon_text = match self.operand {
            Operand::Literal(text) => text,
            Operand::Param(name) => params
                .get(&name)
                .cloned()
                .ok_or(QueryError::MissingParam(name))?,
        };
        Ok(BoundGeoQuery {
            field: self.field,
            kind: self.kind,
            polygon_text,
        })
    }
}

/// Bind without consuming the parsed query
pub fn bind_params(query: &GeoQuery, params: &HashMap<String, String>) -> Result<BoundGeoQuery, QueryError> {
    query.clone().bind(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLY: &str = "POLYGON((0 0, 0 15, 15 15, 15 0, 0 0))";

    #[test]
    fn test_parse_literal() {
        let query = GeoQuery::parse(&format!("@geom:[within:{}]", POLY)).unwrap();
        assert_eq!(query.field, "geom");
        assert_eq!(query.kind, PredicateKind::Within);
        assert_eq!(query.operand, Operand::Literal(POLY.to_string()));

        let query = GeoQuery::parse(&format!("  @geom : [ CONTAINS: {} ] ", POLY)).unwrap();
        assert_eq!(query.kind, PredicateKind::Contains);
        assert_eq!(query.operand, Operand::Literal(POLY.to_string()));
    }

    #[test]
    fn test_parse_param() {
        let query = GeoQuery::parse("@geom:[within $POLY]").unwrap();
        assert_eq!(query.operand, Operand::Param("POLY".to_string()));

        let query = GeoQuery::parse("@geom:[within:$POLY]").unwrap();
        assert_eq!(query.operand, Operand::Param("POLY".to_string()));
    }

    #[test]
    fn test_parse_errors() {
        for text in [
            "geom:[within:POLYGON((0 0, 1 0, 1 1, 0 0))]",
            "@:[within:POLYGON((0 0, 1 0, 1 1, 0 0))]",
            "@geom[within:POLYGON((0 0, 1 0, 1 1, 0 0))]",
            "@geom:[within:POLYGON((0 0, 1 0, 1 1, 0 0))",
            "@geom:[intersects:POLYGON((0 0, 1 0, 1 1, 0 0))]",
            "@geom:[within POLYGON((0 0, 1 0, 1 1, 0 0))]",
            "@geom:[within:]",
            "@geom:[within $]",
            "@geom:[within $PO-LY]",
        ] {
            assert!(
                matches!(GeoQuery::parse(text), Err(QueryError::Syntax(_))),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_bind() {
        let mut params = HashMap::new();
        params.insert("POLY".to_string(), POLY.to_string());

        let bound = GeoQuery::parse("@geom:[within $POLY]").unwrap().bind(&params).unwrap();
        assert_eq!(bound.polygon_text, POLY);
        assert_eq!(bound.field, "geom");

        let parsed = GeoQuery::parse("@geom:[contains $POLY]").unwrap();
        let bound = bind_params(&parsed, &params).unwrap();
        assert_eq!(bound.kind, PredicateKind::Contains);
        assert_eq!(parsed.operand, Operand::Param("POLY".to_string()));

        let err = GeoQuery::parse("@geom:[within $OTHER]").unwrap().bind(&params).unwrap_err();
        assert_eq!(err, QueryError::MissingParam("OTHER".to_string()));

        // literals ignore params
        let literal = format!("@geom:[within:{}]", POLY);
        let bound = GeoQuery::parse(&literal).unwrap().bind(&HashMap::new()).unwrap();
        assert_eq!(bound.polygon_text, POLY);
    }
}
