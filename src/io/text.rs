//! Plain-text patterns: `O` for a live cell, `.` for a dead one, one row
//! per line.

use crate::io::{CoordSet, PatternError};
use crate::node::NodeId;
use crate::table::NodeTable;

/// Decode a plain-text pattern and intern it, returning the root id.
pub fn from_text(table: &mut NodeTable, text: &str) -> Result<NodeId, PatternError> {
    Ok(parse_text(text)?.build(table))
}

/// Parse a plain-text grid into a coordinate set.
pub fn parse_text(text: &str) -> Result<CoordSet, PatternError> {
    let mut cells = CoordSet::default();
    for (y, line) in text.lines().enumerate() {
        for (x, ch) in line.chars().enumerate() {
            match ch {
                'O' => cells.insert(x as u64, y as u64),
                '.' => {}
                c => return Err(PatternError::UnexpectedChar(c)),
            }
        }
    }
    Ok(cells)
}

/// Render the full `2^level x 2^level` grid of `id`, one row per line.
pub fn to_text(table: &NodeTable, id: NodeId) -> String {
    let size = table.node(id).size();
    let mut out = String::with_capacity((size * (size + 1)) as usize);
    for y in 0..size {
        for x in 0..size {
            out.push(if table.get_cell(id, x, y, 0) > 0.5 { 'O' } else { '.' });
        }
        out.push('\n');
    }
    out
}
