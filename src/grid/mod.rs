//! Grid geometry: distance, bounds, occupancy, reachability and
//! area-of-effect shapes.
//!
//! All searches are bounded by the grid size, never by the requested range.

pub mod position;
pub mod occupancy;
pub mod area;

pub use position::{manhattan_distance, Direction, GridBounds, Position};
pub use occupancy::{is_occupied, reachable_cells, PositionMap};
pub use area::{area_of_effect, AreaShape};
