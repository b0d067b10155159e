#![doc = include_str!("../README.md")]

pub mod bounds;
mod error;
pub mod shape;
pub mod store;
pub mod tree;
mod r#type;

pub use bounds::{check_bounds_overlap, Bounds};
pub use error::{Result, ShapefileError};
pub use r#type::{PartType, ShapeType};
pub use shape::{Part, Shape, Vertex};
pub use store::{AccessMode, ShapeStore};
pub use tree::{ShapeSource, ShapeTree, ShapeTreeBuilder};
