//! Path element and path types.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// PathElement represents one level of path navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathElement {
    /// Field name for map fields.
    FieldName(String),
    /// Position in a list.
    Index(usize),
}

impl PathElement {
    /// Creates a new field name path element.
    pub fn field_name(name: impl Into<String>) -> Self {
        PathElement::FieldName(name.into())
    }

    /// Creates a new index path element.
    pub fn index(i: usize) -> Self {
        PathElement::Index(i)
    }

    /// Returns this element as an RFC 6901 reference token.
    pub fn to_pointer_token(&self) -> String {
        match self {
            PathElement::FieldName(name) => name.replace('~', "~0").replace('/', "~1"),
            PathElement::Index(i) => i.to_string(),
        }
    }
}

/// Path represents a complete path to a nested field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    /// Creates a new empty path.
    pub fn new() -> Self {
        Path {
            elements: Vec::new(),
        }
    }

    /// Creates a path from a vector of elements.
    pub fn from_elements(elements: Vec<PathElement>) -> Self {
        Path { elements }
    }

    /// Creates a path made only of field names.
    pub fn from_fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(PathElement::field_name).collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.elements.iter()
    }

    pub fn push(&mut self, element: PathElement) {
        self.elements.push(element);
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    /// Creates a new path with the given element appended.
    pub fn with(&self, element: PathElement) -> Self {
        let mut new_path = self.clone();
        new_path.push(element);
        new_path
    }

    /// Creates a new path with a field name appended.
    pub fn field(&self, name: impl Into<String>) -> Self {
        self.with(PathElement::field_name(name))
    }

    /// Creates a new path with a list index appended.
    pub fn index(&self, i: usize) -> Self {
        self.with(PathElement::index(i))
    }

    /// Splits the path into its parent and last element.
    pub fn split_last(&self) -> Option<(Path, &PathElement)> {
        let (last, parent) = self.elements.split_last()?;
        Some((Path::from_elements(parent.to_vec()), last))
    }

    pub fn as_slice(&self) -> &[PathElement] {
        &self.elements
    }

    /// Renders the path as an RFC 6901 JSON Pointer, e.g.
    /// `/spec/template/spec/containers/0/env`.
    pub fn to_json_pointer(&self) -> String {
        self.elements
            .iter()
            .map(|e| format!("/{}", e.to_pointer_token()))
            .collect()
    }
}

impl FromIterator<PathElement> for Path {
    fn from_iter<T: IntoIterator<Item = PathElement>>(iter: T) -> Self {
        Path {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathElement;
    type IntoIter = std::slice::Iter<'a, PathElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::FieldName(name) => write!(f, ".{}", name),
            PathElement::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}

/// PathError is returned when a dotted path string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("{input:?}: empty field name at offset {offset}")]
    EmptyField { input: String, offset: usize },

    #[error("{input:?}: unterminated index at offset {offset}")]
    UnterminatedIndex { input: String, offset: usize },

    #[error("{input:?}: invalid index {index:?}")]
    InvalidIndex { input: String, index: String },
}

impl FromStr for Path {
    type Err = PathError;

    /// Parses the display form. The leading dot is optional, so both
    /// `spec.template.spec.containers[0].env` and `.metadata.name` parse.
    /// Field names cannot contain `.` or `[` in this notation.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut path = Path::new();
        let bytes = input.as_bytes();
        let mut pos = usize::from(input.starts_with('.'));

        while pos < bytes.len() {
            if bytes[pos] == b'[' {
                let close = input[pos..].find(']').map(|o| pos + o).ok_or_else(|| {
                    PathError::UnterminatedIndex {
                        input: input.to_string(),
                        offset: pos,
                    }
                })?;
                let raw = &input[pos + 1..close];
                let index = raw.parse::<usize>().map_err(|_| PathError::InvalidIndex {
                    input: input.to_string(),
                    index: raw.to_string(),
                })?;
                path.push(PathElement::Index(index));
                pos = close + 1;
                if pos < bytes.len() && bytes[pos] == b'.' {
                    pos += 1;
                    if pos == bytes.len() {
                        return Err(PathError::EmptyField {
                            input: input.to_string(),
                            offset: pos,
                        });
                    }
                }
                continue;
            }

            let end = input[pos..]
                .find(['.', '['])
                .map(|o| pos + o)
                .unwrap_or(bytes.len());
            if end == pos {
                return Err(PathError::EmptyField {
                    input: input.to_string(),
                    offset: pos,
                });
            }
            path.push(PathElement::field_name(&input[pos..end]));
            pos = end;
            if pos < bytes.len() && bytes[pos] == b'.' {
                pos += 1;
                if pos == bytes.len() {
                    return Err(PathError::EmptyField {
                        input: input.to_string(),
                        offset: pos,
                    });
                }
            }
        }

        Ok(path)
    }
}
