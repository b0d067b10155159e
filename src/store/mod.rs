//! Reading and writing shapes in a geometry file and its offset index.

mod codec;
pub(crate) mod constants;
mod file;
mod header;

pub use file::{AccessMode, RecordEntry, ShapeStore, StoreInfo};
