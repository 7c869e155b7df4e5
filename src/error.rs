use thiserror::Error;

/// Errors surfaced by the diff pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    /// The input could not be parsed, even after wrapping it in a synthetic
    /// body element.
    #[error("could not parse the document: {0}")]
    Parse(String),
    /// An edit-script entry addresses a child index that does not exist in
    /// the current state of the tree. This means the script was not produced
    /// by the differ, or a bug in the differ itself.
    #[error("no node at location {0:?}")]
    InvalidLocation(Vec<usize>),
    /// Element properties without a node name, or text properties without a
    /// value.
    #[error("malformed node properties: {0}")]
    MalformedProperties(String),
}
