//! Node records and their identifiers.

use std::fmt;

/// Stable identifier of an interned quadtree node.
///
/// An id both names a node and places it: its low bits, taken modulo the
/// table size, choose the home slot. Ids survive table resizes and any
/// vacuum that keeps the node reachable.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Marks an empty slot. Never handed out for a real node.
    pub(crate) const UNUSED: NodeId = NodeId(0);
    /// The level-0 dead cell, pre-interned in every table.
    pub const OFF: NodeId = NodeId(1);
    /// The level-0 live cell, pre-interned in every table.
    pub const ON: NodeId = NodeId(2);

    #[inline]
    pub(crate) fn slot(self, mask: u64) -> usize {
        (self.0 & mask) as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({:#018x})", self.0)
    }
}

/// One quadtree node: a `2^level x 2^level` region with four children one
/// level down, laid out north-west, north-east, south-west, south-east.
///
/// Records are copied out of the table on lookup; only ids are durable
/// references. For level-0 leaves the child ids are unused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub level: u32,
    pub nw: NodeId,
    pub ne: NodeId,
    pub sw: NodeId,
    pub se: NodeId,
    /// Live cells in the region; the sum of the children's populations.
    pub pop: u64,
}

impl Node {
    /// Side length of the region this node covers.
    #[inline]
    pub fn size(&self) -> u64 {
        1 << self.level
    }
}
