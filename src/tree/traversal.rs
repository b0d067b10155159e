//! Utilities to traverse the ShapeTree structure.

use geo_traits::RectTrait;

use crate::bounds::{Bounds, Coord};
use crate::tree::ShapeTree;

/// A read-only view onto one node of a [`ShapeTree`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'t> {
    /// The tree that this node is a reference onto
    tree: &'t ShapeTree<'t>,

    /// Position of this node in the tree's node arena.
    index: usize,

    /// Depth of this node, with the root at depth 1.
    depth: u32,
}

impl<'t> Node<'t> {
    pub(crate) fn new(tree: &'t ShapeTree<'t>, index: usize, depth: u32) -> Self {
        Self { tree, index, depth }
    }

    /// The region covered by this node.
    pub fn bounds(&self) -> &'t Bounds {
        &self.tree.nodes[self.index].bounds
    }

    /// The ids of the shapes stored directly at this node, in insertion order.
    pub fn shape_ids(&self) -> &'t [u32] {
        &self.tree.nodes[self.index].shape_ids
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns `true` if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.tree.nodes[self.index].children.is_none()
    }

    /// Returns `true` if this node has two children.
    pub fn is_parent(&self) -> bool {
        !self.is_leaf()
    }

    /// Returns `true` if the regions of this node and `other` overlap on the tree's active axes.
    pub fn intersects(&self, other: &Node) -> bool {
        self.bounds().overlaps(other.bounds(), self.tree.dimension)
    }

    /// Returns an iterator over the child nodes of this node. Empty for leaves.
    pub fn children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        let depth = self.depth + 1;
        tree.nodes[self.index]
            .children
            .into_iter()
            .flatten()
            .map(move |index| Node::new(tree, index, depth))
    }
}

impl RectTrait for Node<'_> {
    type T = f64;
    type CoordType<'a>
        = Coord
    where
        Self: 'a;

    fn dim(&self) -> geo_traits::Dimensions {
        geo_traits::Dimensions::Xy
    }

    fn min(&self) -> Self::CoordType<'_> {
        self.bounds().min()
    }

    fn max(&self) -> Self::CoordType<'_> {
        self.bounds().max()
    }
}
