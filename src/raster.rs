//! Sampling a node region into a caller-owned grey buffer.

use crate::node::NodeId;
use crate::table::NodeTable;

/// Fill `buf` (row-major, `buf_w x buf_h`) with grey samples of the window
/// `[x, x + w) x [y, y + h)` of `id`, one sample per `2^min_level` square
/// block. Samples outside the node read as dead.
///
/// Panics if the downsampled window does not fit the buffer.
pub fn rasterise(
    table: &NodeTable,
    id: NodeId,
    buf: &mut [f32],
    buf_w: usize,
    buf_h: usize,
    x: u64,
    y: u64,
    w: u64,
    h: u64,
    min_level: u32,
) {
    let px_w = (w >> min_level) as usize;
    let px_h = (h >> min_level) as usize;
    assert!(
        px_w <= buf_w && px_h <= buf_h && buf_w * buf_h <= buf.len(),
        "raster window does not fit the buffer"
    );
    for row in 0..px_h {
        for col in 0..px_w {
            buf[row * buf_w + col] = table.get_cell(
                id,
                x + ((col as u64) << min_level),
                y + ((row as u64) << min_level),
                min_level,
            );
        }
    }
}
