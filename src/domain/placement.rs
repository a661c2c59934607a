// Automatic placement of newly added visualizations
use super::panel::{GridRect, Visualization};

/// Fixed column count of the responsive grid
pub const COLS: u32 = 12;
pub const DEFAULT_W: u32 = 6;
pub const DEFAULT_H: u32 = 4;
/// Lowest row edge a stored cell may reach
pub const MAX_ROWS: u32 = 100_000;

/// Stack the new visualization below everything already placed.
///
/// Horizontal whitespace on the last row is never reused, so the result
/// cannot overlap any existing rectangle however they are packed.
pub fn place(existing: &[Visualization]) -> GridRect {
    let max_bottom = existing
        .iter()
        .map(|v| v.rect().bottom())
        .max()
        .unwrap_or(0);

    GridRect::new(0, max_bottom, DEFAULT_W, DEFAULT_H)
}
