//! Facilities for working with paths within schemas or validated instances.
use std::{fmt, fmt::Write};

/// JSON Pointer as a wrapper around individual path components.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JsonPointer(Vec<PathChunk>);

impl JsonPointer {
    /// JSON pointer as a vector of strings. Each component is cast to `String`.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
            .into_iter()
            .map(|item| match item {
                PathChunk::Name(value) => value,
                PathChunk::Index(idx) => idx.to_string(),
            })
            .collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in &self.0 {
            f.write_char('/')?;
            match chunk {
                PathChunk::Name(value) => write_escaped(f, value)?,
                PathChunk::Index(idx) => write!(f, "{idx}")?,
            }
        }
        Ok(())
    }
}

/// Write a pointer segment with `~` and `/` escaped per RFC 6901.
pub(crate) fn write_escaped(f: &mut impl Write, segment: &str) -> fmt::Result {
    for ch in segment.chars() {
        match ch {
            '~' => f.write_str("~0")?,
            '/' => f.write_str("~1")?,
            _ => f.write_char(ch)?,
        }
    }
    Ok(())
}

/// A single component of a JSON Pointer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathChunk {
    /// An object property name.
    Name(String),
    /// An array index.
    Index(usize),
}

impl From<String> for PathChunk {
    #[inline]
    fn from(value: String) -> Self {
        PathChunk::Name(value)
    }
}

impl From<&str> for PathChunk {
    #[inline]
    fn from(value: &str) -> Self {
        PathChunk::Name(value.to_string())
    }
}

impl From<usize> for PathChunk {
    #[inline]
    fn from(value: usize) -> Self {
        PathChunk::Index(value)
    }
}

/// A borrowed linked list of path components leading to the currently
/// evaluated instance location. Pushing is allocation-free; the full pointer
/// is materialized only when an error is reported.
#[derive(Clone, Copy, Debug)]
pub(crate) struct InstancePath<'a> {
    chunk: Option<&'a PathChunk>,
    parent: Option<&'a InstancePath<'a>>,
}

impl<'a> InstancePath<'a> {
    pub(crate) const fn new() -> Self {
        InstancePath {
            chunk: None,
            parent: None,
        }
    }

    pub(crate) fn push(&'a self, chunk: &'a PathChunk) -> Self {
        InstancePath {
            chunk: Some(chunk),
            parent: Some(self),
        }
    }

    fn to_vec(self) -> Vec<PathChunk> {
        // The capacity is the average instance depth to avoid extra allocations
        let mut result = Vec::with_capacity(6);
        let mut current = &self;
        if let Some(chunk) = current.chunk {
            result.push(chunk.clone());
        }
        while let Some(next) = current.parent {
            current = next;
            if let Some(chunk) = current.chunk {
                result.push(chunk.clone());
            }
        }
        result.reverse();
        result
    }
}

impl<'a> From<&InstancePath<'a>> for JsonPointer {
    #[inline]
    fn from(path: &InstancePath<'a>) -> Self {
        JsonPointer(path.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::{InstancePath, JsonPointer, PathChunk};

    #[test]
    fn pointer_display() {
        let path = InstancePath::new();
        let outer = PathChunk::from("a/b");
        let path = path.push(&outer);
        let inner = PathChunk::from(3);
        let path = path.push(&inner);
        let pointer = JsonPointer::from(&path);
        assert_eq!(pointer.to_string(), "/a~1b/3");
    }

    #[test]
    fn empty_pointer_display() {
        assert_eq!(JsonPointer::default().to_string(), "");
    }
}
