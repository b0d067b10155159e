use std::fmt::Debug;
use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum ShapefileError {
    /// A store or tree file could not be opened: bad magic, truncated header, inconsistent
    /// offset index.
    #[error("Open error: {0}")]
    Open(String),

    /// A constructed or decoded shape violates the part/vertex invariants.
    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),

    /// A shape could not be encoded for this store, or a record could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A record id outside of `[0, count)`.
    #[error("Record {id} out of range, store has {count} records")]
    Range { id: u32, count: u32 },

    /// A shape id that is not present in the tree.
    #[error("Shape {0} not found in tree")]
    NotFound(u32),

    /// The shape lies entirely outside of the tree's root region. It has still been recorded at
    /// the root.
    #[error("Shape {0} lies outside the tree bounds and was placed at the root")]
    OutOfBounds(u32),

    /// A write was attempted on a store opened read-only.
    #[error("Store was opened read-only")]
    ReadOnly,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShapefileError>;
