//! The B3/S23 rule and the time drivers.
//!
//! `successor` is the heart of the engine: for a level-`k` node it yields
//! the central level-`k-1` node a power of two generations on, memoized
//! through the table's successor cache. `advance` strings those leaps
//! together to reach any generation count exactly.

use crate::node::NodeId;
use crate::table::NodeTable;

/// One cell of the B3/S23 rule: the 3x3 window around `c`, row by row.
/// Takes and returns level-0 ids.
fn base_life(
    nw: NodeId,
    n: NodeId,
    ne: NodeId,
    w: NodeId,
    c: NodeId,
    e: NodeId,
    sw: NodeId,
    s: NodeId,
    se: NodeId,
) -> NodeId {
    let on = |cell: NodeId| (cell == NodeId::ON) as u32;
    let neighbours = on(nw) + on(n) + on(ne) + on(w) + on(e) + on(sw) + on(s) + on(se);
    if neighbours == 3 || (neighbours == 2 && c == NodeId::ON) {
        NodeId::ON
    } else {
        NodeId::OFF
    }
}

impl NodeTable {
    /// The central 2x2 of a 4x4 tile, one generation on.
    pub(crate) fn life_4x4(&mut self, id: NodeId) -> NodeId {
        let m = self.node(id);
        debug_assert_eq!(m.level, 2);
        let a = self.node(m.nw);
        let b = self.node(m.ne);
        let c = self.node(m.sw);
        let d = self.node(m.se);
        let nw = base_life(a.nw, a.ne, b.nw, a.sw, a.se, b.sw, c.nw, c.ne, d.nw);
        let ne = base_life(a.ne, b.nw, b.ne, a.se, b.sw, b.se, c.ne, d.nw, d.ne);
        let sw = base_life(a.sw, a.se, b.sw, c.nw, c.ne, d.nw, c.sw, c.se, d.sw);
        let se = base_life(a.se, b.sw, b.se, c.ne, d.nw, d.ne, c.se, d.sw, d.se);
        self.join(nw, ne, sw, se)
    }

    /// The centre of `id` after `2^j` generations, one level down.
    ///
    /// `j == 0` or `j >= level - 2` requests the natural step of
    /// `2^(level - 2)` generations, the largest leap the node supports
    /// without reading outside its borders. `id` must be at level 2 or
    /// above.
    pub fn successor(&mut self, id: NodeId, j: u32) -> NodeId {
        let level = self.node(id).level;
        debug_assert!(level >= 2, "successor needs at least a 4x4 node");
        let j = if j == 0 || j >= level - 2 { level - 2 } else { j };
        self.step_pow2(id, j)
    }

    /// The centre of `id` after exactly `2^j` generations, `j` zero-based:
    /// unlike the public clamp, `j == 0` means a single generation here,
    /// which is what exact step counts in `advance` need.
    fn step_pow2(&mut self, id: NodeId, j: u32) -> NodeId {
        let n = self.node(id);
        if n.pop == 0 {
            return n.nw;
        }
        if n.level == 2 {
            return self.life_4x4(id);
        }
        let j = j.min(n.level - 2);
        if let Some(hit) = self.cached_successor(id, j) {
            return hit;
        }

        // Nine overlapping half-size windows over the grandchildren.
        let a = self.node(n.nw);
        let b = self.node(n.ne);
        let c = self.node(n.sw);
        let d = self.node(n.se);
        let n00 = n.nw;
        let n01 = self.join(a.ne, b.nw, a.se, b.sw);
        let n02 = n.ne;
        let n10 = self.join(a.sw, a.se, c.nw, c.ne);
        let n11 = self.join(a.se, b.sw, c.ne, d.nw);
        let n12 = self.join(b.sw, b.se, d.nw, d.ne);
        let n20 = n.sw;
        let n21 = self.join(c.ne, d.nw, c.se, d.sw);
        let n22 = n.se;

        let r00 = self.step_pow2(n00, j);
        let r01 = self.step_pow2(n01, j);
        let r02 = self.step_pow2(n02, j);
        let r10 = self.step_pow2(n10, j);
        let r11 = self.step_pow2(n11, j);
        let r12 = self.step_pow2(n12, j);
        let r20 = self.step_pow2(n20, j);
        let r21 = self.step_pow2(n21, j);
        let r22 = self.step_pow2(n22, j);

        let next = if j < n.level - 2 {
            // Sub-maximal step: the windows already sit at time 2^j, so the
            // centre is reassembled purely spatially.
            let s00 = self.node(r00);
            let s01 = self.node(r01);
            let s02 = self.node(r02);
            let s10 = self.node(r10);
            let s11 = self.node(r11);
            let s12 = self.node(r12);
            let s20 = self.node(r20);
            let s21 = self.node(r21);
            let s22 = self.node(r22);
            let nw = self.join(s00.se, s01.sw, s10.ne, s11.nw);
            let ne = self.join(s01.se, s02.sw, s11.ne, s12.nw);
            let sw = self.join(s10.se, s11.sw, s20.ne, s21.nw);
            let se = self.join(s11.se, s12.sw, s21.ne, s22.nw);
            self.join(nw, ne, sw, se)
        } else {
            // Natural step: a second round of successors doubles the leap
            // to 2^(level - 2).
            let q_nw = self.join(r00, r01, r10, r11);
            let q_ne = self.join(r01, r02, r11, r12);
            let q_sw = self.join(r10, r11, r20, r21);
            let q_se = self.join(r11, r12, r21, r22);
            let nw = self.step_pow2(q_nw, j);
            let ne = self.step_pow2(q_ne, j);
            let sw = self.step_pow2(q_sw, j);
            let se = self.step_pow2(q_se, j);
            self.join(nw, ne, sw, se)
        };
        self.cache_successor(id, next, j);
        next
    }

    /// Advance by exactly `steps` generations and crop the result. An empty
    /// root comes back unchanged; `steps == 0` just crops.
    pub fn advance(&mut self, mut id: NodeId, steps: u64) -> NodeId {
        if self.node(id).pop == 0 {
            return id;
        }
        if steps == 0 {
            return self.crop(id);
        }
        let mut remaining = steps;
        let mut j = 0u32;
        while remaining > 0 {
            if remaining & 1 == 1 {
                // Contain the step: outer ring empty, room for 2^j of
                // drift, then one more ring so the pattern sits inside the
                // central quarter of the node it steps from.
                id = self.pad(id);
                while self.node(id).level < j + 3 {
                    id = self.centre(id);
                }
                id = self.centre(id);
                id = self.step_pow2(id, j);
            }
            remaining >>= 1;
            j += 1;
        }
        self.crop(id)
    }

    /// Take `iters` natural steps, padding before each, and return the new
    /// root together with the number of generations covered. Each step
    /// leaps `2^(level - 2)` generations, so the stride grows with the
    /// pattern.
    pub fn ffwd(&mut self, mut id: NodeId, iters: u64) -> (NodeId, u64) {
        let mut generations = 0u64;
        for _ in 0..iters {
            id = self.pad(id);
            id = self.centre(id);
            let level = self.node(id).level;
            generations += 1 << (level - 2);
            id = self.step_pow2(id, level - 2);
        }
        (self.crop(id), generations)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::base_life;
    use crate::node::NodeId;
    use crate::table::NodeTable;

    const ON: NodeId = NodeId::ON;
    const OFF: NodeId = NodeId::OFF;

    #[test]
    fn base_life_truth_table() {
        // birth on exactly three neighbours
        assert_eq!(base_life(ON, OFF, ON, OFF, OFF, OFF, ON, OFF, OFF), ON);
        // survival on two
        assert_eq!(base_life(ON, OFF, ON, OFF, ON, OFF, OFF, OFF, OFF), ON);
        // survival on three
        assert_eq!(base_life(ON, OFF, ON, OFF, ON, OFF, OFF, ON, OFF), ON);
        // loneliness
        assert_eq!(base_life(ON, OFF, OFF, OFF, ON, OFF, OFF, OFF, OFF), OFF);
        assert_eq!(base_life(OFF, OFF, OFF, OFF, ON, OFF, OFF, OFF, OFF), OFF);
        // overcrowding
        assert_eq!(base_life(ON, ON, ON, ON, ON, OFF, OFF, OFF, OFF), OFF);
        // two neighbours do not give birth
        assert_eq!(base_life(ON, OFF, ON, OFF, OFF, OFF, OFF, OFF, OFF), OFF);
        // empty stays empty
        assert_eq!(base_life(OFF, OFF, OFF, OFF, OFF, OFF, OFF, OFF, OFF), OFF);
    }

    #[test]
    fn life_4x4_keeps_a_centred_block() {
        let mut t = NodeTable::new();
        let block = t.join(ON, ON, ON, ON);
        let tile = t.centre(block);
        assert_eq!(t.life_4x4(tile), block);
    }

    #[test]
    fn life_4x4_of_the_empty_tile_is_empty() {
        let mut t = NodeTable::new();
        let z2 = t.get_zero(2);
        let z1 = t.get_zero(1);
        assert_eq!(t.life_4x4(z2), z1);
    }

    #[test]
    fn life_4x4_matches_the_rule_on_every_tile() {
        let mut t = NodeTable::new();
        for bits in 0u32..65536 {
            let mut tile = t.get_zero(2);
            for i in 0..16 {
                if bits & (1 << i) != 0 {
                    tile = t.set_cell(tile, i % 4, i / 4, true);
                }
            }
            assert_eq!(t.node(tile).pop, bits.count_ones() as u64);
            let next = t.life_4x4(tile);
            assert_eq!(t.node(next).level, 1);
            for (cx, cy) in [(1u64, 1u64), (2, 1), (1, 2), (2, 2)] {
                let mut neighbours = 0;
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let (x, y) = (cx as i64 + dx, cy as i64 + dy);
                        if (0..4).contains(&x)
                            && (0..4).contains(&y)
                            && bits & (1 << (y * 4 + x)) != 0
                        {
                            neighbours += 1;
                        }
                    }
                }
                let alive = bits & (1 << (cy * 4 + cx)) != 0;
                let expected = neighbours == 3 || (neighbours == 2 && alive);
                let got = t.get_cell(next, cx - 1, cy - 1, 0) > 0.5;
                assert_eq!(got, expected, "tile {bits:#06x} cell ({cx},{cy})");
            }
        }
    }

    #[test]
    fn natural_step_holds_a_blinker_for_two_generations() {
        let mut t = NodeTable::new();
        let mut root = t.get_zero(3);
        for x in [2u64, 3, 4] {
            root = t.set_cell(root, x, 3, true);
        }
        // 2^(3-2) = 2 generations: a blinker is back to horizontal,
        // reported in the coordinates of the central 4x4 window.
        let next = t.successor(root, 0);
        assert_eq!(t.node(next).level, 2);
        assert_eq!(t.node(next).pop, 3);
        for x in [0u64, 1, 2] {
            assert_eq!(t.get_cell(next, x, 1, 0), 1.0);
        }
    }

    #[test]
    fn successor_of_an_empty_node_is_its_zero_quadrant() {
        let mut t = NodeTable::new();
        let z5 = t.get_zero(5);
        let z4 = t.get_zero(4);
        assert_eq!(t.successor(z5, 0), z4);
        assert_eq!(t.successor(z5, 2), z4);
    }

    #[test]
    fn successor_results_are_memoized() {
        let mut t = NodeTable::new();
        let mut root = t.get_zero(4);
        for (x, y) in [(7u64, 6u64), (8, 7), (6, 8), (7, 8), (8, 8)] {
            root = t.set_cell(root, x, y, true);
        }
        let first = t.successor(root, 0);
        let len = t.len();
        let second = t.successor(root, 0);
        assert_eq!(first, second);
        assert_eq!(t.len(), len, "a cache hit must not intern new nodes");
    }

    #[test]
    fn advance_zero_steps_crops() {
        let mut t = NodeTable::new();
        let mut root = t.get_zero(6);
        root = t.set_cell(root, 31, 31, true);
        root = t.set_cell(root, 32, 31, true);
        root = t.set_cell(root, 31, 32, true);
        root = t.set_cell(root, 32, 32, true);
        let expected = t.crop(root);
        assert_eq!(t.advance(root, 0), expected);
    }

    #[test]
    fn advance_of_an_empty_root_is_identity() {
        let mut t = NodeTable::new();
        let z = t.get_zero(5);
        assert_eq!(t.advance(z, 0), z);
        assert_eq!(t.advance(z, 1), z);
        assert_eq!(t.advance(z, 1_000_000), z);
    }

    #[test]
    fn a_lone_cell_dies_in_one_generation() {
        let mut t = NodeTable::new();
        let root = t.get_zero(3);
        let root = t.set_cell(root, 4, 4, true);
        let next = t.advance(root, 1);
        assert_eq!(t.node(next).pop, 0);
    }

    #[test]
    fn advance_composes() {
        let mut t = NodeTable::new();
        // r-pentomino
        let mut root = t.get_zero(3);
        for (x, y) in [(1u64, 0u64), (2, 0), (0, 1), (1, 1), (1, 2)] {
            root = t.set_cell(root, x, y, true);
        }
        let split = {
            let a = t.advance(root, 37);
            t.advance(a, 63)
        };
        let whole = t.advance(root, 100);
        assert_eq!(split, whole);
    }
}
