//! Quadtree surgery: centring, cropping and cell access.

use crate::node::NodeId;
use crate::table::NodeTable;

impl NodeTable {
    /// Embed `id` in the centre of a node one level up, zeros all round.
    pub fn centre(&mut self, id: NodeId) -> NodeId {
        let m = self.node(id);
        debug_assert!(m.level >= 1, "cannot centre a leaf");
        let z = self.get_zero(m.level - 1);
        let nw = self.join(z, z, z, m.nw);
        let ne = self.join(z, z, m.ne, z);
        let sw = self.join(z, m.sw, z, z);
        let se = self.join(m.se, z, z, z);
        self.join(nw, ne, sw, se)
    }

    /// The central half-size node: the four innermost grandchildren.
    /// Inverse of [`centre`](Self::centre).
    pub fn inner(&mut self, id: NodeId) -> NodeId {
        let n = self.node(id);
        let (nw, ne, sw, se) =
            (self.node(n.nw), self.node(n.ne), self.node(n.sw), self.node(n.se));
        self.join(nw.se, ne.sw, sw.ne, se.nw)
    }

    /// True iff the outer ring holds no live cells, i.e. each child's
    /// population sits entirely in its innermost corner.
    pub fn is_padded(&self, id: NodeId) -> bool {
        let n = self.node(id);
        debug_assert!(n.level >= 2);
        let (nw, ne, sw, se) =
            (self.node(n.nw), self.node(n.ne), self.node(n.sw), self.node(n.se));
        nw.pop == self.node(nw.se).pop
            && ne.pop == self.node(ne.sw).pop
            && sw.pop == self.node(sw.ne).pop
            && se.pop == self.node(se.nw).pop
    }

    /// Shrink to the central node while the outer ring stays empty,
    /// stopping at level 3.
    pub fn crop(&mut self, mut id: NodeId) -> NodeId {
        while self.node(id).level > 3 && self.is_padded(id) {
            id = self.inner(id);
        }
        id
    }

    /// Grow until the node is at least level 3 and its outer ring is empty.
    pub fn pad(&mut self, mut id: NodeId) -> NodeId {
        if self.node(id).level == 0 {
            let z = self.get_zero(0);
            id = self.join(id, z, z, z);
        }
        while self.node(id).level < 3 || !self.is_padded(id) {
            id = self.centre(id);
        }
        id
    }

    /// Rewrite cell `(x, y)` and return the new root id. Coordinates beyond
    /// the current size grow the root towards the south-east, zeros on the
    /// far sides, so existing cells keep their positions.
    pub fn set_cell(&mut self, mut id: NodeId, x: u64, y: u64, state: bool) -> NodeId {
        let mut n = self.node(id);
        if n.level == 0 {
            return if state { NodeId::ON } else { NodeId::OFF };
        }
        while x >= n.size() || y >= n.size() {
            let z = self.get_zero(n.level);
            id = self.join(id, z, z, z);
            n = self.node(id);
        }
        let half = 1u64 << (n.level - 1);
        let (mut nw, mut ne, mut sw, mut se) = (n.nw, n.ne, n.sw, n.se);
        if x < half && y < half {
            nw = self.set_cell(nw, x, y, state);
        } else if y < half {
            ne = self.set_cell(ne, x - half, y, state);
        } else if x < half {
            sw = self.set_cell(sw, x, y - half, state);
        } else {
            se = self.set_cell(se, x - half, y - half, state);
        }
        self.join(nw, ne, sw, se)
    }

    /// Collect the coordinates of every live cell, skipping empty subtrees,
    /// in row-major order within each quadrant.
    pub fn live_cells(&self, id: NodeId) -> Vec<(u64, u64)> {
        let mut cells = Vec::with_capacity(self.node(id).pop as usize);
        self.collect_live(id, 0, 0, &mut cells);
        cells
    }

    fn collect_live(&self, id: NodeId, x: u64, y: u64, cells: &mut Vec<(u64, u64)>) {
        let n = self.node(id);
        if n.pop == 0 {
            return;
        }
        if n.level == 0 {
            cells.push((x, y));
            return;
        }
        let half = 1u64 << (n.level - 1);
        self.collect_live(n.nw, x, y, cells);
        self.collect_live(n.ne, x + half, y, cells);
        self.collect_live(n.sw, x, y + half, cells);
        self.collect_live(n.se, x + half, y + half, cells);
    }

    /// Grey value at `(x, y)`, descending no deeper than `min_level`: the
    /// terminal node's population over its area, so `min_level == 0` reads
    /// single cells as 0.0 or 1.0 and coarser levels read averages.
    /// Out-of-range coordinates read as dead.
    pub fn get_cell(&self, id: NodeId, x: u64, y: u64, min_level: u32) -> f32 {
        let n = self.node(id);
        if x >= n.size() || y >= n.size() {
            return 0.0;
        }
        if n.level == 0 || n.level == min_level {
            return n.pop as f32 / 4f32.powi(n.level as i32);
        }
        let half = 1u64 << (n.level - 1);
        if x < half && y < half {
            self.get_cell(n.nw, x, y, min_level)
        } else if y < half {
            self.get_cell(n.ne, x - half, y, min_level)
        } else if x < half {
            self.get_cell(n.sw, x, y - half, min_level)
        } else {
            self.get_cell(n.se, x - half, y - half, min_level)
        }
    }
}
