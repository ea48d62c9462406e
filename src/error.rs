use thiserror::Error;

use crate::ir::TypeName;

/// A `ref` node whose uri the mapping does not contain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolved reference `{uri}`")]
pub struct ReferenceResolutionError {
    pub uri: String,
}

/// Malformed or contradictory input document. `path` is a JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid schema at `{path}`: {reason}")]
pub struct InvalidSchemaError {
    pub path: String,
    pub reason: String,
}

/// A node the emitter or exporter can not render. `path` is a JSON pointer
/// into the tree (property names, member indexes, wrapper names).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at `{path}` is not serializable: {reason}")]
pub struct NotSerializableError {
    pub path: String,
    pub kind: TypeName,
    pub reason: String,
}

/// Declaration text that does not follow the emitter's grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at byte {offset}: {reason}")]
pub struct ParseError {
    pub offset: usize,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Reference(#[from] ReferenceResolutionError),
    #[error(transparent)]
    InvalidSchema(#[from] InvalidSchemaError),
    #[error(transparent)]
    NotSerializable(#[from] NotSerializableError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// JSON pointer segment escaping (`~` → `~0`, `/` → `~1`).
pub(crate) fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Append a segment to a JSON pointer.
pub(crate) fn join_pointer(base: &str, segment: &str) -> String {
    format!("{base}/{}", escape_pointer(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_segments_are_escaped() {
        assert_eq!(join_pointer("", "a/b"), "/a~1b");
        assert_eq!(join_pointer("/properties", "x~y"), "/properties/x~0y");
    }

    #[test]
    fn messages_name_the_subject() {
        let e = ReferenceResolutionError { uri: "#/defs/a".into() };
        assert_eq!(e.to_string(), "unresolved reference `#/defs/a`");
        let e: Error = InvalidSchemaError { path: "/type".into(), reason: "unknown type `foo`".into() }.into();
        assert!(e.to_string().contains("/type"));
    }
}
