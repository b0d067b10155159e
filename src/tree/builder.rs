use crate::bounds::Bounds;
use crate::error::{Result, ShapefileError};
use crate::tree::constants::DEFAULT_MAX_DEPTH_LIMIT;
use crate::tree::index::ShapeTree;
use crate::tree::r#trait::ShapeSource;

/// A builder to create a [`ShapeTree`] over a [`ShapeSource`].
///
/// ```
/// use geo_shapefile::{Shape, ShapeType};
/// use geo_shapefile::tree::ShapeTreeBuilder;
///
/// let shapes = vec![
///     Shape::simple(ShapeType::Point, vec![1.], vec![1.], None).unwrap(),
///     Shape::simple(ShapeType::Point, vec![9.], vec![9.], None).unwrap(),
/// ];
/// let tree = ShapeTreeBuilder::new(&shapes, 2).max_depth(4).finish().unwrap();
/// assert_eq!(tree.num_shapes(), 2);
/// ```
pub struct ShapeTreeBuilder<'a> {
    source: &'a dyn ShapeSource,
    dimension: usize,
    max_depth: u32,
    bounds: Option<Bounds>,
    populate: bool,
    cache_shapes: bool,
}

impl<'a> ShapeTreeBuilder<'a> {
    /// Create a new builder over `source`, splitting on the first `dimension` of the X, Y, Z and M
    /// axes.
    ///
    /// ## Panics
    ///
    /// If `dimension` is not 2, 3 or 4.
    pub fn new<S: ShapeSource + 'a>(source: &'a S, dimension: usize) -> Self {
        assert!(
            (2..=4).contains(&dimension),
            "dimension must be 2, 3 or 4, got {}",
            dimension
        );
        Self {
            source,
            dimension,
            max_depth: 0,
            bounds: None,
            populate: true,
            cache_shapes: false,
        }
    }

    /// The depth of the deepest node, the root being at depth 1.
    ///
    /// The default of 0 picks a depth from the number of shapes in the source.
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The region covered by the root. Defaults to the extent of the source.
    pub fn bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Whether to insert every shape of the source when finishing. Defaults to `true`.
    pub fn populate(mut self, populate: bool) -> Self {
        self.populate = populate;
        self
    }

    /// Whether populated shapes stay cached in their nodes. Defaults to `false`.
    pub fn cache_shapes(mut self, cache_shapes: bool) -> Self {
        self.cache_shapes = cache_shapes;
        self
    }

    /// Consume this builder, creating the tree and inserting the source's shapes in ascending id
    /// order.
    ///
    /// Null shapes are skipped. Shapes outside of the tree's bounds are kept at the root and
    /// logged. Any read failure is returned.
    pub fn finish(self) -> Result<ShapeTree<'a>> {
        let num_shapes = self.source.num_shapes();
        let max_depth = if self.max_depth == 0 {
            default_max_depth(num_shapes)
        } else {
            self.max_depth
        };
        let bounds = self
            .bounds
            .or_else(|| self.source.extent())
            .unwrap_or_default();

        let mut tree = ShapeTree::new(Some(self.source), self.dimension, max_depth, bounds);
        log::debug!(
            "Building {}D tree of depth {} over {} shapes",
            self.dimension,
            max_depth,
            num_shapes
        );

        if self.populate {
            for shape_id in 0..num_shapes {
                let shape = self.source.read_shape(shape_id)?;
                let result = if self.cache_shapes {
                    tree.add_shape_cached(shape)
                } else {
                    tree.add_shape(&shape)
                };
                match result {
                    Ok(()) | Err(ShapefileError::OutOfBounds(_)) => {}
                    Err(err) => return Err(err),
                }
            }
        }

        Ok(tree)
    }
}

/// Pick a depth for `num_shapes` shapes.
///
/// Grows by one for every doubling of the shape count, so that a balanced tree ends up with a few
/// shapes per leaf, and is clamped to `1..=DEFAULT_MAX_DEPTH_LIMIT`.
pub(crate) fn default_max_depth(num_shapes: u32) -> u32 {
    let num_shapes = num_shapes as u64;
    let mut max_depth = 0;
    let mut num_nodes: u64 = 1;
    while num_nodes * 4 < num_shapes {
        max_depth += 1;
        num_nodes *= 2;
    }
    max_depth.clamp(1, DEFAULT_MAX_DEPTH_LIMIT)
}
