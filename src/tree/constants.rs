/// Magic bytes at the start of a serialized tree.
pub(crate) const TREE_MAGIC: [u8; 4] = *b"SQTB";

/// Version of the serialized tree layout.
pub(crate) const TREE_VERSION: u32 = 1;

/// The depth chosen by [`ShapeTreeBuilder`][crate::tree::ShapeTreeBuilder] when no max depth is
/// given never exceeds this.
pub const DEFAULT_MAX_DEPTH_LIMIT: u32 = 12;

/// Bit set in a serialized node's flags when its first child follows.
pub(crate) const HAS_FIRST_CHILD: u8 = 0b01;

/// Bit set in a serialized node's flags when its second child follows.
pub(crate) const HAS_SECOND_CHILD: u8 = 0b10;
