//! Run-length-encoded Life patterns.
//!
//! Tokens: `b` dead run, `o` live run, `$` end of row, `!` end of pattern,
//! with an optional leading count. `#` comment lines and the `x = ...`
//! header line are tolerated and ignored.

use crate::io::{CoordSet, PatternError};
use crate::node::NodeId;
use crate::table::NodeTable;

/// Decode an RLE pattern and intern it, returning the root id. The table
/// is untouched if the pattern is ill-formed.
pub fn from_rle(table: &mut NodeTable, rle: &str) -> Result<NodeId, PatternError> {
    Ok(parse_rle(rle)?.build(table))
}

/// Parse RLE into a coordinate set without touching any table.
pub fn parse_rle(rle: &str) -> Result<CoordSet, PatternError> {
    let mut cells = CoordSet::default();
    let (mut x, mut y) = (0u64, 0u64);
    let mut count = 0u64;
    let mut terminated = false;

    'lines: for line in rle.lines() {
        let line = line.trim();
        let Some(first) = line.chars().next() else {
            continue;
        };
        // anything that does not open with a token is a comment or the
        // size header
        if !first.is_ascii_digit() && !matches!(first, 'b' | 'o' | '$' | '!') {
            continue;
        }
        for ch in line.chars() {
            let run = count.max(1);
            match ch {
                '0'..='9' => {
                    count = count
                        .checked_mul(10)
                        .and_then(|c| c.checked_add(u64::from(ch as u8 - b'0')))
                        .ok_or(PatternError::CountOverflow)?;
                }
                'b' => {
                    x = x.checked_add(run).ok_or(PatternError::CountOverflow)?;
                    count = 0;
                }
                'o' => {
                    for i in 0..run {
                        cells.insert(x + i, y);
                    }
                    x = x.checked_add(run).ok_or(PatternError::CountOverflow)?;
                    count = 0;
                }
                '$' => {
                    y = y.checked_add(run).ok_or(PatternError::CountOverflow)?;
                    x = 0;
                    count = 0;
                }
                '!' => {
                    terminated = true;
                    break 'lines;
                }
                c if c.is_whitespace() => {}
                c => return Err(PatternError::UnexpectedChar(c)),
            }
        }
    }
    if !terminated {
        return Err(PatternError::MissingTerminator);
    }
    Ok(cells)
}

/// Encode the full `2^level x 2^level` grid of `id` as RLE, with the
/// customary size header, coalescing runs and omitting counts of one.
pub fn to_rle(table: &NodeTable, id: NodeId) -> String {
    let size = table.node(id).size();
    let mut out = format!("x={size},y={size}, rule = B3/S23\n");
    for y in 0..size {
        let mut run: Option<(bool, u64)> = None;
        for x in 0..size {
            let alive = table.get_cell(id, x, y, 0) > 0.5;
            run = match run {
                Some((state, len)) if state == alive => Some((state, len + 1)),
                Some((state, len)) => {
                    push_run(&mut out, state, len);
                    Some((alive, 1))
                }
                None => Some((alive, 1)),
            };
        }
        if let Some((state, len)) = run {
            push_run(&mut out, state, len);
        }
        out.push('$');
    }
    out.push('!');
    out
}

fn push_run(out: &mut String, alive: bool, len: u64) {
    if len > 1 {
        out.push_str(&len.to_string());
    }
    out.push(if alive { 'o' } else { 'b' });
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const GLIDER: &str = "bob$2bo$3o!";
    const GUN: &str = "24bo11b$22bobo11b$12b2o6b2o12b2o$11bo3bo4b2o12b2o$2o8bo5bo3b2o14b$\
                       2o8bo3bob2o4bobo11b$10bo5bo7bo11b$11bo3bo20b$12b2o!";

    #[test]
    fn decodes_the_glider() {
        let mut t = NodeTable::new();
        let glider = from_rle(&mut t, GLIDER).unwrap();
        assert_eq!(t.node(glider).pop, 5);
        assert_eq!(t.node(glider).level, 2);
        for (x, y) in [(1u64, 0u64), (2, 1), (0, 2), (1, 2), (2, 2)] {
            assert_eq!(t.get_cell(glider, x, y, 0), 1.0, "expected a live cell at ({x},{y})");
        }
    }

    #[test]
    fn decodes_the_glider_gun() {
        let mut t = NodeTable::new();
        let gun = from_rle(&mut t, GUN).unwrap();
        assert_eq!(t.node(gun).pop, 36);
    }

    #[test]
    fn round_trips_through_the_encoder() {
        let mut t = NodeTable::new();
        let gun = from_rle(&mut t, GUN).unwrap();
        let encoded = to_rle(&t, gun);
        let again = from_rle(&mut t, &encoded).unwrap();
        assert_eq!(again, gun);
        assert_eq!(to_rle(&t, again), encoded);
    }

    #[test]
    fn tolerates_comments_and_the_header() {
        let mut t = NodeTable::new();
        let bare = from_rle(&mut t, GLIDER).unwrap();
        let annotated = from_rle(
            &mut t,
            "#N Glider\n#C the smallest spaceship\nx = 3, y = 3, rule = B3/S23\nbob$2bo$3o!",
        )
        .unwrap();
        assert_eq!(annotated, bare);
    }

    #[test]
    fn a_lone_cell_gets_the_smallest_square() {
        let mut t = NodeTable::new();
        let dot = from_rle(&mut t, "o!").unwrap();
        assert_eq!(t.node(dot).level, 2);
        assert_eq!(t.node(dot).pop, 1);
        assert_eq!(t.get_cell(dot, 0, 0, 0), 1.0);
    }

    #[test]
    fn missing_terminator_is_an_error_and_leaves_the_table_alone() {
        let mut t = NodeTable::new();
        let len = t.len();
        assert_eq!(from_rle(&mut t, "3o$obo"), Err(PatternError::MissingTerminator));
        assert_eq!(t.len(), len);
    }

    #[test]
    fn unknown_tokens_are_rejected() {
        let mut t = NodeTable::new();
        assert_eq!(from_rle(&mut t, "3o$2q!"), Err(PatternError::UnexpectedChar('q')));
    }

    #[test]
    fn trailing_content_after_the_terminator_is_ignored() {
        let mut t = NodeTable::new();
        let a = from_rle(&mut t, GLIDER).unwrap();
        let b = from_rle(&mut t, "bob$2bo$3o!\nthis text is not part of the pattern").unwrap();
        assert_eq!(a, b);
    }
}
