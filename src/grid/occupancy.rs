//! Occupancy and reachability.

use rustc_hash::FxHashMap;

use super::position::{manhattan_distance, GridBounds, Position};
use crate::core::EntityId;

/// Entity positions keyed by id.
pub type PositionMap = FxHashMap<EntityId, Position>;

/// Whether a living entity other than `exclude` stands on `pos`.
///
/// Dead entities keep their position but never block a cell.
pub fn is_occupied(
    pos: Position,
    positions: &PositionMap,
    is_alive: impl Fn(EntityId) -> bool,
    exclude: Option<EntityId>,
) -> bool {
    positions
        .iter()
        .any(|(&id, &p)| p == pos && Some(id) != exclude && is_alive(id))
}

/// Every in-bounds, unoccupied cell within `range` Manhattan steps of
/// `origin`, in row-major order.
///
/// Only the range's bounding box clipped to the grid is scanned.
pub fn reachable_cells(
    bounds: GridBounds,
    origin: Position,
    range: u32,
    occupied: impl Fn(Position) -> bool,
) -> Vec<Position> {
    let r = range.min(bounds.diameter()) as i32;
    let (min_x, max_x) = ((origin.x - r).max(0), (origin.x + r).min(bounds.width - 1));
    let (min_y, max_y) = ((origin.y - r).max(0), (origin.y + r).min(bounds.height - 1));

    let mut cells = Vec::new();
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let cell = Position::new(x, y);
            if manhattan_distance(origin, cell) <= range && !occupied(cell) {
                cells.push(cell);
            }
        }
    }
    cells
}
