//! A binary region tree over the shapes of a store, and its file format.

pub mod builder;
pub mod constants;
pub mod index;
mod persist;
pub mod r#trait;
pub mod traversal;

pub use builder::ShapeTreeBuilder;
pub use constants::DEFAULT_MAX_DEPTH_LIMIT;
pub use index::ShapeTree;
pub use r#trait::ShapeSource;
pub use traversal::Node;
