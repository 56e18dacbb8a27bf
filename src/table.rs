//! The interned node store.
//!
//! A power-of-two array of slots indexed by the low bits of the node id,
//! resolved by linear probing. Structurally identical subtrees always share
//! one slot and one id (hash-consing). The load factor is kept at or below
//! one quarter; exceeding it doubles the array and reinserts every node at
//! its id's new home, so ids stay valid while slot positions do not.
//!
//! Each slot additionally carries a `(from, to, j)` triple implementing the
//! successor memo. Those fields belong to the slot position, not to the
//! node stored there, and losing them only ever costs recomputation.

use tracing::debug;

use crate::hash::{hash_quad, mix64};
use crate::node::{Node, NodeId};

pub(crate) const INIT_TABLE_SIZE: usize = 4096;
const MIN_TABLE_SIZE: usize = 16;

/// Nodes at or below this level are never vacuumed: the leaves, the 2x2
/// tiles and the 4x4 tiles feeding the base case stay interned for the
/// lifetime of the table.
const KEEP_LEVEL: u32 = 2;

#[derive(Clone, Copy)]
struct Slot {
    // the interned node; `id == UNUSED` marks the slot empty
    id: NodeId,
    level: u32,
    nw: NodeId,
    ne: NodeId,
    sw: NodeId,
    se: NodeId,
    pop: u64,
    // transient vacuum mark
    marked: bool,
    // successor memo for the key hashing to this slot
    from: NodeId,
    to: NodeId,
    j: u32,
}

impl Slot {
    const EMPTY: Slot = Slot {
        id: NodeId::UNUSED,
        level: 0,
        nw: NodeId::UNUSED,
        ne: NodeId::UNUSED,
        sw: NodeId::UNUSED,
        se: NodeId::UNUSED,
        pop: 0,
        marked: false,
        from: NodeId::UNUSED,
        to: NodeId::UNUSED,
        j: 0,
    };
}

/// A self-contained Life universe: every node, the zero-node cache and the
/// successor memo live here. There are no globals; independent tables are
/// fully independent engines, and `clone` yields one.
#[derive(Clone)]
pub struct NodeTable {
    slots: Box<[Slot]>,
    mask: u64,
    count: usize,
    // canonical all-off node per level, grown lazily by self-join
    zeros: Vec<NodeId>,
}

impl Default for NodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTable {
    pub fn new() -> Self {
        Self::with_capacity(INIT_TABLE_SIZE)
    }

    /// Create a table with at least `initial_size` slots, rounded up to a
    /// power of two (minimum 16), with the two leaves pre-interned.
    pub fn with_capacity(initial_size: usize) -> Self {
        let size = initial_size.max(MIN_TABLE_SIZE).next_power_of_two();
        let mut slots = vec![Slot::EMPTY; size].into_boxed_slice();
        let mask = size as u64 - 1;
        // The reserved leaf ids are small integers, so their home slots are
        // free in any fresh table and distinct from the empty marker.
        slots[NodeId::OFF.slot(mask)] = Slot { id: NodeId::OFF, pop: 0, ..Slot::EMPTY };
        slots[NodeId::ON.slot(mask)] = Slot { id: NodeId::ON, pop: 1, ..Slot::EMPTY };
        NodeTable { slots, mask, count: 2, zeros: vec![NodeId::OFF] }
    }

    /// Number of interned nodes.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Number of slots. Always a power of two and at least `4 * len()`.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Fetch the record for `id`, by value. Ids are stable; references into
    /// the table are not, so callers keep the copy and re-fetch after any
    /// operation that may intern.
    ///
    /// Panics if `id` was never interned or has been vacuumed away.
    pub fn node(&self, id: NodeId) -> Node {
        let s = &self.slots[self.slot_index(id)];
        Node {
            id: s.id,
            level: s.level,
            nw: s.nw,
            ne: s.ne,
            sw: s.sw,
            se: s.se,
            pop: s.pop,
        }
    }

    fn slot_index(&self, id: NodeId) -> usize {
        debug_assert_ne!(id, NodeId::UNUSED);
        let mut i = id.slot(self.mask);
        loop {
            let s = &self.slots[i];
            if s.id == id {
                return i;
            }
            assert!(s.id != NodeId::UNUSED, "lookup of dead node {id:?}");
            i = (i + 1) & self.mask as usize;
        }
    }

    fn resolves(&self, id: NodeId) -> bool {
        if id == NodeId::UNUSED {
            return false;
        }
        let mut i = id.slot(self.mask);
        loop {
            let s = &self.slots[i];
            if s.id == id {
                return true;
            }
            if s.id == NodeId::UNUSED {
                return false;
            }
            i = (i + 1) & self.mask as usize;
        }
    }

    /// Intern the node with the four given children and return its id; the
    /// existing id if the tuple is already present.
    ///
    /// May resize the table. The children must all be interned and share a
    /// level.
    pub fn join(&mut self, nw: NodeId, ne: NodeId, sw: NodeId, se: NodeId) -> NodeId {
        let mut id = Self::candidate(hash_quad(nw.0, ne.0, sw.0, se.0));
        let mut i = id.slot(self.mask);
        loop {
            let s = self.slots[i];
            if s.id == NodeId::UNUSED {
                break;
            }
            if s.id == id {
                if s.nw == nw && s.ne == ne && s.sw == sw && s.se == se {
                    return id;
                }
                // Doppelganger: same id over a different tuple. Derive a
                // fresh id and restart the probe from its home slot.
                id = Self::candidate(mix64(id.0));
                i = id.slot(self.mask);
                continue;
            }
            i = (i + 1) & self.mask as usize;
        }

        let a = self.node(nw);
        let b = self.node(ne);
        let c = self.node(sw);
        let d = self.node(se);
        debug_assert!(
            a.level == b.level && a.level == c.level && a.level == d.level,
            "join of children at mismatched levels"
        );
        let cur = self.slots[i];
        self.slots[i] = Slot {
            id,
            level: a.level + 1,
            nw,
            ne,
            sw,
            se,
            pop: a.pop + b.pop + c.pop + d.pop,
            ..cur
        };
        self.count += 1;
        if self.count * 4 >= self.slots.len() {
            self.grow();
        }
        id
    }

    // Candidate ids must stay clear of the empty marker and the two
    // reserved leaf ids.
    fn candidate(mut h: u64) -> NodeId {
        while h <= NodeId::ON.0 {
            h = mix64(h);
        }
        NodeId(h)
    }

    fn grow(&mut self) {
        let new_size = self.slots.len() * 2;
        let new_mask = new_size as u64 - 1;
        let mut new_slots = vec![Slot::EMPTY; new_size].into_boxed_slice();
        for s in self.slots.iter() {
            if s.id == NodeId::UNUSED {
                continue;
            }
            let mut i = s.id.slot(new_mask);
            while new_slots[i].id != NodeId::UNUSED {
                i = (i + 1) & new_mask as usize;
            }
            // Successor memo entries are keyed by slot position under the
            // old mask; they do not survive the move.
            new_slots[i] = Slot { marked: false, from: NodeId::UNUSED, to: NodeId::UNUSED, j: 0, ..*s };
        }
        self.slots = new_slots;
        self.mask = new_mask;
        debug!(size = new_size, count = self.count, "node table resized");
    }

    /// Canonical all-off node at `level`, built by self-join on first use.
    pub fn get_zero(&mut self, level: u32) -> NodeId {
        while self.zeros.len() <= level as usize {
            let z = self.zeros[self.zeros.len() - 1];
            let up = self.join(z, z, z, z);
            self.zeros.push(up);
        }
        self.zeros[level as usize]
    }

    fn cache_slot(&self, from: NodeId, j: u32) -> usize {
        NodeId(hash_quad(from.0, j as u64, from.0, j as u64)).slot(self.mask)
    }

    /// Memoized successor for `(from, j)`, if the single candidate slot
    /// holds exactly that key. Non-probing: a miss only costs recomputation.
    pub(crate) fn cached_successor(&self, from: NodeId, j: u32) -> Option<NodeId> {
        let s = &self.slots[self.cache_slot(from, j)];
        (s.from == from && s.j == j).then_some(s.to)
    }

    /// Record `to = successor(from, j)`, overwriting whatever key occupied
    /// the slot.
    pub(crate) fn cache_successor(&mut self, from: NodeId, to: NodeId, j: u32) {
        let i = self.cache_slot(from, j);
        let s = &mut self.slots[i];
        s.from = from;
        s.to = to;
        s.j = j;
    }

    /// Drop every node above the keep level that is not reachable from
    /// `top`, rebuilding the slot array. Survivors keep their ids and
    /// records; successor memo entries with a discarded endpoint are
    /// scrubbed.
    pub fn vacuum(&mut self, top: NodeId) {
        let before = self.count;
        self.mark(top);

        let size = self.slots.len();
        let mut new_slots = vec![Slot::EMPTY; size].into_boxed_slice();
        let mut count = 0usize;
        for s in self.slots.iter() {
            if s.id == NodeId::UNUSED || !(s.marked || s.level <= KEEP_LEVEL) {
                continue;
            }
            let mut i = s.id.slot(self.mask);
            while new_slots[i].id != NodeId::UNUSED {
                i = (i + 1) & self.mask as usize;
            }
            new_slots[i] = Slot { marked: false, from: NodeId::UNUSED, to: NodeId::UNUSED, j: 0, ..*s };
            count += 1;
        }
        // The memo fields belong to slot positions and the mask is
        // unchanged, so carry them across before scrubbing.
        for (dst, src) in new_slots.iter_mut().zip(self.slots.iter()) {
            dst.from = src.from;
            dst.to = src.to;
            dst.j = src.j;
        }
        self.slots = new_slots;
        self.count = count;
        // Zero nodes above the keep level may just have been swept; they
        // rebuild on demand.
        self.zeros.truncate(KEEP_LEVEL as usize + 1);

        for i in 0..size {
            let (from, to) = (self.slots[i].from, self.slots[i].to);
            if from != NodeId::UNUSED && !(self.resolves(from) && self.resolves(to)) {
                let s = &mut self.slots[i];
                s.from = NodeId::UNUSED;
                s.to = NodeId::UNUSED;
                s.j = 0;
            }
        }
        debug!(before, after = self.count, "vacuum compacted node table");
    }

    fn mark(&mut self, id: NodeId) {
        let i = self.slot_index(id);
        let s = &mut self.slots[i];
        if s.level < 2 || s.marked {
            return;
        }
        s.marked = true;
        let (nw, ne, sw, se) = (s.nw, s.ne, s.sw, s.se);
        self.mark(nw);
        self.mark(ne);
        self.mark(sw);
        self.mark(se);
    }
}
