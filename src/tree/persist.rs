//! Reading and writing trees to their own binary file.
//!
//! The layout is a fixed 88 byte header followed by every node in pre-order. Each node is its 8
//! bound values, a `u32` id count, the ids as `u32`, and a flags byte telling whether children
//! follow. Values are stored in native byte order and a file written on a machine of the other
//! endianness is rejected by its magic. Cached shapes are not stored.

use std::fs;
use std::path::Path;

use bytemuck::{bytes_of, cast_slice, pod_read_unaligned, Pod, Zeroable};
use tinyvec::TinyVec;

use crate::bounds::Bounds;
use crate::error::{Result, ShapefileError};
use crate::tree::constants::{HAS_FIRST_CHILD, HAS_SECOND_CHILD, TREE_MAGIC, TREE_VERSION};
use crate::tree::index::{ShapeTree, TreeNode};
use crate::tree::r#trait::ShapeSource;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct TreeHeader {
    root_bounds: [f64; 8],
    magic: [u8; 4],
    version: u32,
    dimension: u32,
    max_depth: u32,
    num_nodes: u32,
    reserved: u32,
}

const HEADER_SIZE: usize = std::mem::size_of::<TreeHeader>();
const NODE_BOUNDS_SIZE: usize = std::mem::size_of::<[f64; 8]>();

impl<'a> ShapeTree<'a> {
    /// Write this tree to `path`, replacing any existing file.
    pub fn write_tree(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = self.to_bytes()?;
        fs::write(path.as_ref(), data)?;
        log::debug!(
            "Wrote tree with {} nodes to {}",
            self.nodes.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Read a tree written by [`ShapeTree::write_tree`].
    ///
    /// `source` is only needed by [`ShapeTree::search_shapes`], since no shapes are cached after
    /// reading.
    pub fn read_tree(
        path: impl AsRef<Path>,
        source: Option<&'a dyn ShapeSource>,
    ) -> Result<ShapeTree<'a>> {
        let data = fs::read(path.as_ref())?;
        let mut tree = Self::from_bytes(&data)?;
        tree.source = source;
        Ok(tree)
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        let num_nodes = u32::try_from(self.nodes.len()).map_err(|_| {
            ShapefileError::Encoding(format!("Too many nodes to write: {}.", self.nodes.len()))
        })?;
        let header = TreeHeader {
            root_bounds: self.nodes[0].bounds.to_array(),
            magic: TREE_MAGIC,
            version: TREE_VERSION,
            dimension: self.dimension as u32,
            max_depth: self.max_depth,
            num_nodes,
            reserved: 0,
        };

        let mut data = Vec::with_capacity(HEADER_SIZE + self.nodes.len() * (NODE_BOUNDS_SIZE + 5));
        data.extend_from_slice(bytes_of(&header));

        let mut stack: TinyVec<[usize; 32]> = TinyVec::new();
        stack.push(0);
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            data.extend_from_slice(cast_slice(node.bounds.to_array().as_slice()));
            data.extend_from_slice(bytes_of(&(node.shape_ids.len() as u32)));
            data.extend_from_slice(cast_slice(node.shape_ids.as_slice()));
            match node.children {
                Some([first, second]) => {
                    data.push(HAS_FIRST_CHILD | HAS_SECOND_CHILD);
                    stack.push(second);
                    stack.push(first);
                }
                None => data.push(0),
            }
        }

        Ok(data)
    }

    pub(crate) fn from_bytes(data: &[u8]) -> Result<ShapeTree<'a>> {
        let mut reader = TreeReader { data, pos: 0 };
        let header: TreeHeader = pod_read_unaligned(reader.take(HEADER_SIZE)?);

        if header.magic != TREE_MAGIC {
            return Err(ShapefileError::Open(
                "Data is not a tree file, or was written with another byte order.".to_string(),
            ));
        }
        if header.version != TREE_VERSION {
            return Err(ShapefileError::Open(format!(
                "Got tree file v{} when expected v{}.",
                header.version, TREE_VERSION
            )));
        }
        if !(2..=4).contains(&header.dimension) {
            return Err(ShapefileError::Open(format!(
                "Invalid tree dimension {}.",
                header.dimension
            )));
        }
        if header.max_depth == 0 {
            return Err(ShapefileError::Open("Invalid tree depth 0.".to_string()));
        }

        let mut nodes: Vec<TreeNode> = vec![];
        // (parent, child slot) the next node belongs to, and its depth
        let mut pending: Vec<(Option<(usize, usize)>, u32)> = vec![(None, 1)];
        while let Some((parent, depth)) = pending.pop() {
            if nodes.len() >= header.num_nodes as usize {
                return Err(ShapefileError::Open(format!(
                    "Tree file holds more than the {} nodes its header declares.",
                    header.num_nodes
                )));
            }

            let bounds = Bounds::from_array(pod_read_unaligned(reader.take(NODE_BOUNDS_SIZE)?));
            let count: u32 = pod_read_unaligned(reader.take(4)?);
            let ids = reader.take(count as usize * 4)?;
            let shape_ids: Vec<u32> = ids.chunks_exact(4).map(pod_read_unaligned).collect();
            let flags = reader.take(1)?[0];

            let index = nodes.len();
            let mut node = TreeNode::new(bounds);
            node.shapes = vec![None; shape_ids.len()];
            node.shape_ids = shape_ids;

            match flags {
                0 => {}
                flags if flags == HAS_FIRST_CHILD | HAS_SECOND_CHILD => {
                    if depth >= header.max_depth {
                        return Err(ShapefileError::Open(format!(
                            "Tree node at depth {} has children but the max depth is {}.",
                            depth, header.max_depth
                        )));
                    }
                    // Filled in once the children are read
                    node.children = Some([index, index]);
                    pending.push((Some((index, 1)), depth + 1));
                    pending.push((Some((index, 0)), depth + 1));
                }
                flags => {
                    return Err(ShapefileError::Open(format!(
                        "Invalid tree node flags {:#04b}.",
                        flags
                    )))
                }
            }
            nodes.push(node);

            if let Some((parent, slot)) = parent {
                if let Some(children) = nodes[parent].children.as_mut() {
                    children[slot] = index;
                }
            }
        }

        if nodes.len() != header.num_nodes as usize {
            return Err(ShapefileError::Open(format!(
                "Tree file holds {} nodes but its header declares {}.",
                nodes.len(),
                header.num_nodes
            )));
        }
        if reader.pos != data.len() {
            return Err(ShapefileError::Open(format!(
                "{} trailing bytes after the last tree node.",
                data.len() - reader.pos
            )));
        }

        nodes[0].bounds = Bounds::from_array(header.root_bounds);
        Ok(ShapeTree {
            source: None,
            dimension: header.dimension as usize,
            max_depth: header.max_depth,
            nodes,
        })
    }
}

struct TreeReader<'d> {
    data: &'d [u8],
    pos: usize,
}

impl<'d> TreeReader<'d> {
    fn take(&mut self, len: usize) -> Result<&'d [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                ShapefileError::Open(format!(
                    "Tree file truncated: wanted {} bytes at offset {} of {}.",
                    len,
                    self.pos,
                    self.data.len()
                ))
            })?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }
}
