use std::fmt;

use geo_traits::{CoordTrait, RectTrait};
use tinyvec::TinyVec;

use crate::bounds::Bounds;
use crate::error::{Result, ShapefileError};
use crate::shape::Shape;
use crate::tree::r#trait::ShapeSource;
use crate::tree::traversal::Node;

/// One region of the tree.
///
/// `shapes` runs parallel to `shape_ids` and holds whichever shapes have been cached so far.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TreeNode {
    pub(crate) bounds: Bounds,
    pub(crate) shape_ids: Vec<u32>,
    pub(crate) shapes: Vec<Option<Shape>>,
    pub(crate) children: Option<[usize; 2]>,
}

impl TreeNode {
    pub(crate) fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            shape_ids: vec![],
            shapes: vec![],
            children: None,
        }
    }

    fn push(&mut self, shape_id: u32, shape: Option<Shape>) {
        self.shape_ids.push(shape_id);
        self.shapes.push(shape);
    }
}

/// A binary region tree over the shapes of a [`ShapeSource`].
///
/// Each node covers a region and the two children of a node split that region in half at its
/// midpoint, cycling through the active axes by depth. A shape is stored at the deepest node whose
/// region fully contains its bounds, so shapes that straddle a split stay with the parent.
///
/// Nodes live in an arena with the root at index 0.
pub struct ShapeTree<'a> {
    pub(crate) source: Option<&'a dyn ShapeSource>,
    pub(crate) dimension: usize,
    pub(crate) max_depth: u32,
    pub(crate) nodes: Vec<TreeNode>,
}

impl fmt::Debug for ShapeTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeTree")
            .field("has_source", &self.source.is_some())
            .field("dimension", &self.dimension)
            .field("max_depth", &self.max_depth)
            .field("nodes", &self.nodes)
            .finish()
    }
}

impl<'a> ShapeTree<'a> {
    pub(crate) fn new(
        source: Option<&'a dyn ShapeSource>,
        dimension: usize,
        max_depth: u32,
        bounds: Bounds,
    ) -> Self {
        Self {
            source,
            dimension,
            max_depth,
            nodes: vec![TreeNode::new(bounds)],
        }
    }

    /// How many of the X, Y, Z, M axes take part in splits and overlap tests.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// The region covered by the root.
    pub fn bounds(&self) -> &Bounds {
        &self.nodes[0].bounds
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The number of ids stored across all nodes.
    pub fn num_shapes(&self) -> usize {
        self.nodes.iter().map(|node| node.shape_ids.len()).sum()
    }

    /// Access the root node for manual traversal.
    pub fn root(&self) -> Node<'_> {
        Node::new(self, 0, 1)
    }

    /// Add a shape's id to the tree, placed according to the shape's bounds.
    ///
    /// Null shapes have no extent and are not indexed. Returns
    /// [`ShapefileError::OutOfBounds`] if the shape lies entirely outside the tree's region, in
    /// which case the id has still been stored at the root.
    pub fn add_shape(&mut self, shape: &Shape) -> Result<()> {
        let Some(shape_id) = checked_id(shape)? else {
            return Ok(());
        };
        self.insert(shape_id, *shape.bounds(), None)
    }

    /// Like [`ShapeTree::add_shape`], but also keeps the shape cached in its node.
    pub fn add_shape_cached(&mut self, shape: Shape) -> Result<()> {
        let Some(shape_id) = checked_id(&shape)? else {
            return Ok(());
        };
        let bounds = *shape.bounds();
        self.insert(shape_id, bounds, Some(shape))
    }

    pub(crate) fn insert(
        &mut self,
        shape_id: u32,
        bounds: Bounds,
        shape: Option<Shape>,
    ) -> Result<()> {
        if !self.nodes[0].bounds.overlaps(&bounds, self.dimension) {
            log::warn!(
                "Shape {} lies outside of the tree bounds, storing it at the root",
                shape_id
            );
            self.nodes[0].push(shape_id, shape);
            return Err(ShapefileError::OutOfBounds(shape_id));
        }

        let mut node = 0;
        let mut depth = 1;
        while depth < self.max_depth {
            let (first, second) = match self.nodes[node].children {
                Some([first, second]) => (self.nodes[first].bounds, self.nodes[second].bounds),
                None => self.nodes[node].bounds.split(self.split_axis(depth)),
            };

            let which = if first.contains(&bounds, self.dimension) {
                0
            } else if second.contains(&bounds, self.dimension) {
                1
            } else {
                break;
            };

            let children = match self.nodes[node].children {
                Some(children) => children,
                None => {
                    let children = [self.nodes.len(), self.nodes.len() + 1];
                    self.nodes.push(TreeNode::new(first));
                    self.nodes.push(TreeNode::new(second));
                    self.nodes[node].children = Some(children);
                    children
                }
            };
            node = children[which];
            depth += 1;
        }

        self.nodes[node].push(shape_id, shape);
        Ok(())
    }

    /// The axis split by the children of a node at `depth`, the root being at depth 1.
    pub(crate) fn split_axis(&self, depth: u32) -> usize {
        (depth as usize - 1) % self.dimension
    }

    /// Remove the first occurrence of `shape_id`, searching depth-first from the root.
    ///
    /// Nodes left empty are kept.
    pub fn remove_shape(&mut self, shape_id: u32) -> Result<()> {
        let mut stack: TinyVec<[usize; 32]> = TinyVec::new();
        stack.push(0);

        while let Some(node) = stack.pop() {
            let node = &mut self.nodes[node];
            if let Some(pos) = node.shape_ids.iter().position(|id| *id == shape_id) {
                node.shape_ids.remove(pos);
                node.shapes.remove(pos);
                return Ok(());
            }
            if let Some([first, second]) = node.children {
                // Pushed in reverse so that the first child is searched first
                stack.push(second);
                stack.push(first);
            }
        }

        Err(ShapefileError::NotFound(shape_id))
    }

    /// Ids of all shapes stored in nodes whose region overlaps `bounds`, in ascending order.
    ///
    /// This is a superset of the shapes that actually overlap `bounds`: every id stored at a
    /// visited node is returned regardless of its own bounds.
    pub fn find_likely_shapes(&self, bounds: &Bounds) -> Vec<u32> {
        let mut results = vec![];
        for node in self.visit(bounds) {
            results.extend_from_slice(&self.nodes[node].shape_ids);
        }
        results.sort_unstable();
        results
    }

    /// Search with an XY rectangle. The Z and M axes of the query are unbounded.
    pub fn find_likely_shapes_rect(&self, rect: &impl RectTrait<T = f64>) -> Vec<u32> {
        let bounds = Bounds::new(
            [rect.min().x(), rect.min().y(), f64::NEG_INFINITY, f64::NEG_INFINITY],
            [rect.max().x(), rect.max().y(), f64::INFINITY, f64::INFINITY],
        );
        self.find_likely_shapes(&bounds)
    }

    /// Shapes whose own bounds overlap `bounds`, in ascending id order.
    ///
    /// Candidates are filtered by their actual bounds. Shapes that are not cached yet are loaded
    /// from the tree's source and cached in their node.
    pub fn search_shapes(&mut self, bounds: &Bounds) -> Result<Vec<Shape>> {
        let mut results = vec![];
        for node in self.visit(bounds) {
            for i in 0..self.nodes[node].shape_ids.len() {
                if self.nodes[node].shapes[i].is_none() {
                    let shape_id = self.nodes[node].shape_ids[i];
                    let source = self.source.ok_or_else(|| {
                        ShapefileError::Open(format!(
                            "Tree has no shape source to load shape {} from.",
                            shape_id
                        ))
                    })?;
                    self.nodes[node].shapes[i] = Some(source.read_shape(shape_id)?);
                }

                if let Some(shape) = &self.nodes[node].shapes[i] {
                    if shape.bounds().overlaps(bounds, self.dimension) {
                        results.push(shape.clone());
                    }
                }
            }
        }
        results.sort_by_key(|shape| shape.shape_id());
        Ok(results)
    }

    /// Arena indices of all nodes whose region overlaps `bounds`, parents before children.
    fn visit(&self, bounds: &Bounds) -> Vec<usize> {
        let mut visited = vec![];
        if !self.nodes[0].bounds.overlaps(bounds, self.dimension) {
            return visited;
        }

        let mut stack: TinyVec<[usize; 32]> = TinyVec::new();
        stack.push(0);
        while let Some(node) = stack.pop() {
            visited.push(node);
            if let Some(children) = self.nodes[node].children {
                for child in children {
                    if self.nodes[child].bounds.overlaps(bounds, self.dimension) {
                        stack.push(child);
                    }
                }
            }
        }
        visited
    }
}

/// The id to index `shape` under, or `None` for null shapes.
fn checked_id(shape: &Shape) -> Result<Option<u32>> {
    if shape.is_null() {
        log::debug!("Skipping null shape {:?}", shape.shape_id());
        return Ok(None);
    }
    shape.shape_id().map(Some).ok_or_else(|| {
        ShapefileError::MalformedGeometry("Cannot index a shape without an id.".to_string())
    })
}
