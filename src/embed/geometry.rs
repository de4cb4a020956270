//! Placement and size of the embedded region.

use crate::host::{CellSize, Rect, RegionSize};

/// Clamp a requested anchor line into `0..line_count`.
pub fn clamp_anchor_line(line: i64, line_count: usize) -> usize {
    let last = line_count.saturating_sub(1);
    usize::try_from(line).map_or(0, |line| line.min(last))
}

/// Full height of the region: `max_lines` text lines plus the button bar.
pub fn full_height(max_lines: usize, cell: CellSize, button_height: u32) -> u32 {
    u32::try_from(max_lines)
        .unwrap_or(u32::MAX)
        .saturating_mul(cell.height)
        .saturating_add(button_height)
}

/// Size of the region docked below a line whose top is at `anchor_y`.
///
/// The height is capped so the region never extends past the text area
/// minus one line; the width spans the text area, leaving the gutter and
/// scrollbars uncovered.
pub fn region_size(
    text_rect: Rect,
    cell: CellSize,
    anchor_y: Option<i32>,
    max_lines: usize,
    button_height: u32,
) -> RegionSize {
    let top = anchor_y.unwrap_or(0);
    let available = i64::from(text_rect.bottom) - i64::from(top) - i64::from(cell.height);
    let available = u32::try_from(available.max(0)).unwrap_or(u32::MAX);

    RegionSize {
        width: u32::try_from(text_rect.width().max(0)).unwrap_or(0),
        height: full_height(max_lines, cell, button_height).min(available),
    }
}
