/// Path expressions over JSON documents: `$`, `.key`, `["key"]`, `[index]`
use crate::{GeoError, Result};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parsed path; an empty segment list addresses the document root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

fn invalid(path: &str, reason: &str) -> GeoError {
    GeoError::InvalidPath(format!("'{}': {}", path, reason))
}

impl JsonPath {
    /// Parse a path; the leading `$` is optional (`geom` == `$.geom`)
    pub fn parse(text: &str) -> Result<Self> {
        let path = text.trim();
        if path.is_empty() {
            return Err(invalid(text, "empty path"));
        }

        let chars: Vec<char> = path.chars().collect();
        let mut position = 0;
        let mut segments = Vec::new();

        if chars[0] == '$' {
            position = 1;
        } else if chars[0] != '.' && chars[0] != '[' {
            let key = Self::read_key(&chars, &mut position);
            if key.is_empty() {
                return Err(invalid(text, "expected a key"));
            }
            segments.push(PathSegment::Key(key));
        }

        while position < chars.len() {
            match chars[position] {
                '.' => {
                    position += 1;
                    let key = Self::read_key(&chars, &mut position);
                    if key.is_empty() {
                        return Err(invalid(text, "expected a key after '.'"));
                    }
                    segments.push(PathSegment::Key(key));
                }
                '[' => {
                    position += 1;
                    let segment = match chars.get(position) {
                        Some(&quote) if quote == '"' || quote == '\'' => {
                            position += 1;
                            let start = position;
                            while position < chars.len() && chars[position] != quote {
                                position += 1;
                            }
                            if position >= chars.len() {
                                return Err(invalid(text, "unterminated quoted key"));
                            }
                            let key: String = chars[start..position].iter().collect();
                            position += 1;
                            PathSegment::Key(key)
                        }
                        Some(c) if c.is_ascii_digit() => {
                            let start = position;
                            while position < chars.len() && chars[position].is_ascii_digit() {
                                position += 1;
                            }
                            let digits: String = chars[start..position].iter().collect();
                            let index = digits
                                .parse()
                                .map_err(|_| invalid(text, "array index out of range"))?;
                            PathSegment::Index(index)
                        }
                        _ => return Err(invalid(text, "expected a quoted key or an index after '['")),
                    };
                    if chars.get(position) != Some(&']') {
                        return Err(invalid(text, "expected ']'"));
                    }
                    position += 1;
                    segments.push(segment);
                }
                c => return Err(invalid(text, &format!("unexpected character '{}'", c))),
            }
        }

        Ok(Self { segments })
    }

    fn read_key(chars: &[char], position: &mut usize) -> String {
        let start = *position;
        while *position < chars.len() && chars[*position] != '.' && chars[*position] != '[' {
            *position += 1;
        }
        chars[start..*position].iter().collect()
    }

    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn get<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.segments.iter().try_fold(document, |value, segment| match segment {
            PathSegment::Key(key) => value.get(key.as_str()),
            PathSegment::Index(index) => value.get(*index),
        })
    }

    /// Set the value at this path. Parents must exist; a missing last key
    /// is created on an object parent.
    pub fn set(&self, document: &mut Value, new_value: Value) -> Result<()> {
        let (last, parents) = match self.segments.split_last() {
            Some(split) => split,
            None => {
                *document = new_value;
                return Ok(());
            }
        };

        let mut current = document;
        for segment in parents {
            current = match segment {
                PathSegment::Key(key) => current.get_mut(key.as_str()),
                PathSegment::Index(index) => current.get_mut(*index),
            }
            .ok_or_else(|| GeoError::InvalidPath(format!("'{}': parent does not exist", self)))?;
        }

        match (last, current) {
            (PathSegment::Key(key), Value::Object(map)) => {
                map.insert(key.clone(), new_value);
                Ok(())
            }
            (PathSegment::Index(index), Value::Array(items)) if *index < items.len() => {
                items[*index] = new_value;
                Ok(())
            }
            _ => Err(GeoError::WrongType(format!(
                "'{}': parent is not a matching object or array",
                self
            ))),
        }
    }

    /// Remove the value at this path; returns whether it existed.
    /// Removing the root is not supported here (callers delete the record).
    pub fn remove(&self, document: &mut Value) -> bool {
        let (last, parents) = match self.segments.split_last() {
            Some(split) => split,
            None => return false,
        };

        let mut current = document;
        for segment in parents {
            let next = match segment {
                PathSegment::Key(key) => current.get_mut(key.as_str()),
                PathSegment::Index(index) => current.get_mut(*index),
            };
            current = match next {
                Some(value) => value,
                None => return false,
            };
        }

        match (last, current) {
            (PathSegment::Key(key), Value::Object(map)) => map.remove(key).is_some(),
            (PathSegment::Index(index), Value::Array(items)) if *index < items.len() => {
                items.remove(*index);
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) if key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                    write!(f, ".{}", key)?
                }
                PathSegment::Key(key) => write!(f, "[\"{}\"]", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}
