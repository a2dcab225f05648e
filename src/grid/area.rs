//! Area-of-effect shapes.

use serde::{Deserialize, Serialize};

use super::position::{Direction, GridBounds, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaShape {
    Sphere,
    Circle,
    Cone,
    Line,
}

impl AreaShape {
    /// Whether the shape starts at the caster and extends along a facing.
    #[must_use]
    pub const fn is_directional(self) -> bool {
        matches!(self, AreaShape::Cone | AreaShape::Line)
    }
}

/// Cells covered by `shape` of `size` at `origin`, clipped to `bounds`.
///
/// - Sphere/Circle: `dx² + dy² <= size²` around `origin`
/// - Cone: step `i` in `1..=size` along `direction`, spreading `i - 1`
///   cells to each side
/// - Line: `origin + direction * i` for `i` in `1..=size`
///
/// Directional shapes never include `origin` itself. Cells are unique and
/// returned in generation order.
pub fn area_of_effect(
    bounds: GridBounds,
    shape: AreaShape,
    origin: Position,
    size: u32,
    direction: Direction,
) -> Vec<Position> {
    let s = size.min(bounds.diameter()) as i32;
    let mut cells = Vec::new();
    let mut push = |cell: Position| {
        if bounds.contains(cell) && !cells.contains(&cell) {
            cells.push(cell);
        }
    };

    match shape {
        AreaShape::Sphere | AreaShape::Circle => {
            for dy in -s..=s {
                for dx in -s..=s {
                    if dx * dx + dy * dy <= s * s {
                        push(origin.offset(dx, dy));
                    }
                }
            }
        }
        AreaShape::Cone => {
            let (fx, fy) = direction.delta();
            // Perpendicular to the facing
            let (lx, ly) = (-fy, fx);
            for i in 1..=s {
                for lateral in -(i - 1)..=(i - 1) {
                    push(origin.offset(fx * i + lx * lateral, fy * i + ly * lateral));
                }
            }
        }
        AreaShape::Line => {
            let (fx, fy) = direction.delta();
            for i in 1..=s {
                push(origin.offset(fx * i, fy * i));
            }
        }
    }

    cells
}
