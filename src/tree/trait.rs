use crate::bounds::Bounds;
use crate::error::{Result, ShapefileError};
use crate::shape::Shape;
use crate::store::ShapeStore;

/// Anything a [`ShapeTree`][crate::tree::ShapeTree] can be built over and load shapes from.
///
/// Shape ids are the positions `0..num_shapes()`.
pub trait ShapeSource {
    /// The number of shapes, including null shapes.
    fn num_shapes(&self) -> u32;

    /// The extent of all shapes, `None` if there are no non-null shapes.
    fn extent(&self) -> Option<Bounds>;

    /// Load the shape with the given id.
    fn read_shape(&self, id: u32) -> Result<Shape>;
}

impl ShapeSource for ShapeStore {
    fn num_shapes(&self) -> u32 {
        self.num_records()
    }

    fn extent(&self) -> Option<Bounds> {
        self.bounds()
    }

    fn read_shape(&self, id: u32) -> Result<Shape> {
        ShapeStore::read_shape(self, id)
    }
}

/// An in-memory collection, where each shape's id is its position.
///
/// Only the first `u32::MAX` shapes are addressable.
impl ShapeSource for Vec<Shape> {
    fn num_shapes(&self) -> u32 {
        u32::try_from(self.len()).unwrap_or(u32::MAX)
    }

    fn extent(&self) -> Option<Bounds> {
        let mut shapes = self.iter().filter(|shape| !shape.is_null());
        let mut extent = *shapes.next()?.bounds();
        for shape in shapes {
            extent.expand(shape.bounds());
        }
        Some(extent)
    }

    fn read_shape(&self, id: u32) -> Result<Shape> {
        let mut shape = self
            .get(id as usize)
            .ok_or(ShapefileError::Range {
                id,
                count: self.num_shapes(),
            })?
            .clone();
        shape.set_shape_id(Some(id));
        Ok(shape)
    }
}
