//! Positioning heuristic: close to the distance the entity fights best at.

use tracing::debug;

use crate::core::{CombatState, Entity};
use crate::grid::{manhattan_distance, reachable_cells, Position};
use crate::spellcasting::SpellBook;

/// The distance `entity` prefers to keep from its target.
///
/// Anyone with a melee attack wants to be adjacent. Ranged-only attackers
/// keep their longest weapon range, capped at `max_ideal`. Entities with no
/// attacks at all use the reach of their offensive spells the same way.
#[must_use]
pub fn ideal_distance(entity: &Entity, book: &SpellBook, max_ideal: u32) -> u32 {
    if entity.has_melee_attack() {
        return 1;
    }
    if let Some(range) = entity.attacks.iter().map(|a| a.range).max() {
        return range.clamp(1, max_ideal.max(1));
    }
    entity
        .castable_spells(book)
        .filter(|s| s.is_offensive())
        .map(|s| s.reach())
        .max()
        .map_or(1, |reach| reach.clamp(1, max_ideal.max(1)))
}

/// Closest living positioned opponent; ties go to roster order.
#[must_use]
pub fn nearest_opponent<'a>(state: &'a CombatState, entity: &Entity) -> Option<&'a Entity> {
    let origin = entity.position?;
    let mut best: Option<(&Entity, u32)> = None;
    for candidate in state.opponents_of(entity.team) {
        let Some(pos) = candidate.position else { continue };
        let d = manhattan_distance(origin, pos);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(e, _)| e)
}

/// Cell `entity` should move to this turn, or `None` to stay put.
///
/// Every free cell within the effective movement range is scored by
/// `100 - |distance_to_target - ideal| - 0.1 * movement_cost` and the first
/// best in row-major order wins. The current cell competes too; winning
/// with it means no move.
#[must_use]
pub fn calculate_optimal_movement(
    state: &CombatState,
    book: &SpellBook,
    entity: &Entity,
    max_ideal: u32,
) -> Option<Position> {
    let origin = entity.position?;
    let range = entity.effects.aggregate().effective_movement(entity.movement);
    if range == 0 {
        return None;
    }
    let target = nearest_opponent(state, entity)?;
    let target_pos = target.position?;
    let ideal = ideal_distance(entity, book, max_ideal);
    if manhattan_distance(origin, target_pos) <= ideal {
        return None;
    }

    let cells = reachable_cells(state.bounds(), origin, range, |cell| {
        state.is_occupied(cell, Some(entity.id))
    });

    let mut best: Option<(Position, f32)> = None;
    for cell in cells {
        let off_ideal = manhattan_distance(cell, target_pos).abs_diff(ideal) as f32;
        let cost = manhattan_distance(origin, cell) as f32;
        let score = 100.0 - off_ideal - 0.1 * cost;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((cell, score));
        }
    }

    let (cell, score) = best?;
    debug!(entity = %entity.id, opponent = %target.id, ideal, ?cell, score, "movement");
    (cell != origin).then_some(cell)
}
